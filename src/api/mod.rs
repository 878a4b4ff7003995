//! HTTP 触发层
//!
//! 系统唯一的对外表面：一个带共享密钥的触发端点。
//! 定时器和人工触发走同一个契约

pub mod trigger;

use crate::orchestrator::App;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub use trigger::{TriggerError, TriggerParams, TriggerResponse};

/// 构建 HTTP 路由
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route(
            "/v1/publish/trigger",
            get(trigger::trigger_handler).post(trigger::trigger_handler),
        )
        .with_state(app)
}
