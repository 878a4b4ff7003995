pub mod job_ctx;
pub mod publish_flow;

pub use job_ctx::JobCtx;
pub use publish_flow::PublishFlow;
