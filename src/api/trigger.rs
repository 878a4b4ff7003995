//! 触发端点
//!
//! 对外契约：
//! - `GET/POST /v1/publish/trigger?token=<密钥>&count=<篇数>`
//! - 令牌必须与配置一致，否则 401 且无任何副作用
//! - 已有一轮在跑时 409，同样无副作用
//! - 响应是运行报告的 JSON 形态；非 200 即调用方可见的失败，
//!   定时层收到失败只记日志，不自动重试（下个周期就是重试）

use crate::models::{JobSummary, RunMode, RunReport};
use crate::orchestrator::App;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// 触发请求参数
#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    token: Option<String>,
    count: Option<usize>,
}

/// 触发响应（运行报告的对外 JSON 形态）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub success: bool,
    pub mode: String,
    pub total_requested: usize,
    pub success_count: usize,
    pub average_quality_score: f64,
    pub results: Vec<JobSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerResponse {
    pub fn from_report(report: RunReport) -> Self {
        Self {
            success: true,
            mode: report.mode.to_string(),
            total_requested: report.requested_count,
            success_count: report.success_count,
            average_quality_score: report.average_quality_score,
            results: report.jobs,
            error: None,
        }
    }
}

/// 触发层拒绝原因
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("触发令牌缺失或不匹配")]
    Unauthorized,
    #[error("已有一轮运行在进行中")]
    RunActive,
    #[error("参数不合法: {0}")]
    BadRequest(String),
    #[error("运行失败: {0}")]
    Internal(String),
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        let status = match &self {
            TriggerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TriggerError::RunActive => StatusCode::CONFLICT,
            TriggerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TriggerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// GET/POST /v1/publish/trigger 的处理函数
pub async fn trigger_handler(
    State(app): State<Arc<App>>,
    Query(params): Query<TriggerParams>,
) -> Result<Json<TriggerResponse>, TriggerError> {
    // 鉴权先行：失败的请求不产生任何副作用
    if let Err(e) = app.authorize(params.token.as_deref()) {
        warn!("⛔ 拒绝触发请求: {}", e);
        return Err(TriggerError::Unauthorized);
    }

    let count = params.count.unwrap_or(app.config().default_post_count);
    if count == 0 {
        return Err(TriggerError::BadRequest("count 必须为正整数".to_string()));
    }

    info!("📥 收到手动触发请求: count={}", count);
    match app.trigger_run(count, RunMode::Manual).await {
        Ok(report) => Ok(Json(TriggerResponse::from_report(report))),
        Err(e) if e.is_run_already_active() => Err(TriggerError::RunActive),
        Err(e) => Err(TriggerError::Internal(e.to_string())),
    }
}
