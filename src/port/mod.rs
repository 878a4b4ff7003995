//! 外部协作方接口（端口层）
//!
//! 核心只依赖这些 trait，不认识任何具体厂商：
//! - `TextCompletion` - LLM 文本补全服务
//! - `FactSearch` - 事实检索服务
//! - `ImageLookup` - 图库检索服务
//! - `BlogPublisher` - 发布目标平台
//!
//! 方法返回手工装箱的 Future（`BoxFuture`），保证 trait 对象安全，
//! 生产实现在 `adapter/`，测试可以注入桩实现

pub mod blog_publisher;
pub mod fact_search;
pub mod image_lookup;
pub mod text_completion;

pub use blog_publisher::{BlogPost, BlogPublisher, PublishReceipt};
pub use fact_search::{FactSearch, SearchHit};
pub use image_lookup::{ImageLookup, StockImage};
pub use text_completion::{CompletionRequest, TextCompletion};
