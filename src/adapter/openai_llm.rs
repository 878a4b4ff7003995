//! LLM 适配器
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::port::{CompletionRequest, TextCompletion};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use futures::future::BoxFuture;
use tracing::{debug, warn};

/// OpenAI 兼容的文本补全客户端
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiCompletion {
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }
}

impl TextCompletion for OpenAiCompletion {
    fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, AppResult<String>> {
        Box::pin(async move {
            debug!("调用 LLM API，模型: {}", self.model_name);
            debug!("用户消息长度: {} 字符", request.user.len());

            // 构建消息列表
            let mut messages = Vec::new();

            if let Some(system) = &request.system {
                let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()
                    .map_err(|e| AppError::generation_failed(&self.model_name, e))?;
                messages.push(ChatCompletionRequestMessage::System(system_msg));
            }

            let user_msg = ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()
                .map_err(|e| AppError::generation_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::User(user_msg));

            let chat_request = CreateChatCompletionRequestArgs::default()
                .model(&self.model_name)
                .messages(messages)
                .temperature(request.temperature)
                .max_tokens(request.max_tokens)
                .build()
                .map_err(|e| AppError::generation_failed(&self.model_name, e))?;

            let response = self.client.chat().create(chat_request).await.map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                AppError::generation_failed(&self.model_name, e)
            })?;

            debug!("LLM API 调用成功");

            // 提取响应内容
            let content = response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| {
                    AppError::Generation(GenerationError::EmptyContent {
                        model: self.model_name.clone(),
                    })
                })?;

            Ok(content.trim().to_string())
        })
    }
}
