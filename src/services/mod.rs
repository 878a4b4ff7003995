pub mod content_generator;
pub mod image_service;
pub mod llm_service;
pub mod publish_service;
pub mod quality_scorer;
pub mod research_service;
pub mod topic_dedup;
pub mod topic_generator;

pub use content_generator::ContentGenerator;
pub use image_service::ImageService;
pub use llm_service::LlmService;
pub use publish_service::PublishService;
pub use quality_scorer::QualityScorer;
pub use research_service::VerifiedResearch;
pub use topic_dedup::TopicDeduplicator;
pub use topic_generator::TopicGenerator;
