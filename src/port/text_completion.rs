use crate::error::AppResult;
use futures::future::BoxFuture;

/// 一次文本补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// 系统消息（可选）
    pub system: Option<String>,
    /// 用户消息
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// LLM 文本补全服务
pub trait TextCompletion: Send + Sync {
    /// 发起一次补全，返回模型的文本输出
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, AppResult<String>>;
}
