//! 外部协作方的生产实现（适配器层）
//!
//! 每个适配器实现 `port/` 中对应的 trait，只做协议转换，不含业务规则

pub mod blog_api;
pub mod openai_llm;
pub mod search_api;
pub mod stock_image;

pub use blog_api::BlogApiPublisher;
pub use openai_llm::OpenAiCompletion;
pub use search_api::HttpFactSearch;
pub use stock_image::StockImageApi;
