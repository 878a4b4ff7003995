//! LLM 服务 - 业务能力层
//!
//! 只负责"调一次 LLM"能力，不关心流程
//!
//! 在端口之上统一做三件事：配额预占、有限重试（指数退避）、成本记账。
//! 其他所有需要 LLM 的服务都经由这里调用

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::infrastructure::{usage_tracker::cost, ApiKind, UsageTracker};
use crate::port::{CompletionRequest, TextCompletion};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// LLM 服务
///
/// 职责：
/// - 调用文本补全端口并做有限重试
/// - 每次调用前预占配额，成功后记账
/// - 不认识 Topic / Draft
/// - 不关心流程顺序
#[derive(Clone)]
pub struct LlmService {
    llm: Arc<dyn TextCompletion>,
    usage: Arc<UsageTracker>,
    model_name: String,
    max_retries: u32,
    backoff_ms: u64,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, llm: Arc<dyn TextCompletion>, usage: Arc<UsageTracker>) -> Self {
        Self {
            llm,
            usage,
            model_name: config.llm_model_name.clone(),
            max_retries: config.llm_max_retries.max(1),
            backoff_ms: config.llm_backoff_ms,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，其他所有 LLM 相关功能都应该基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `temperature` / `max_tokens`: 按用途传入（选题发散、评分收敛）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> AppResult<String> {
        debug!("调用 LLM，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut request = CompletionRequest::new(user_message)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        if let Some(system) = system_message {
            request = request.with_system(system);
        }

        // 重试逻辑
        let mut last_err: Option<AppError> = None;
        for retry_count in 0..self.max_retries {
            if retry_count > 0 {
                let backoff = self.backoff_ms * (1u64 << (retry_count - 1));
                warn!(
                    "LLM 调用失败 (尝试 {}/{}), 等待 {}ms 后重试...",
                    retry_count, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            // 每次重试都是一次真实调用，单独预占配额
            self.usage.reserve(ApiKind::LlmCompletion)?;

            match self.llm.complete(request.clone()).await {
                Ok(content) if !content.trim().is_empty() => {
                    self.usage.record(ApiKind::LlmCompletion, cost::LLM_COMPLETION);
                    return Ok(content);
                }
                Ok(_) => {
                    last_err = Some(AppError::Generation(GenerationError::EmptyContent {
                        model: self.model_name.clone(),
                    }));
                }
                Err(e) => {
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AppError::Generation(GenerationError::EmptyContent {
                model: self.model_name.clone(),
            })
        }))
    }

    /// 当前使用的模型名
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}
