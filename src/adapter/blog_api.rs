//! 发布平台适配器
//!
//! 对接博客平台的 REST API；平台按 slug 识别文章，
//! 已存在的 slug 返回 409，这里折算成幂等跳过而不是错误

use crate::config::Config;
use crate::error::{AppError, AppResult, PublishError};
use crate::port::{BlogPost, BlogPublisher, PublishReceipt};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default)]
    id: String,
}

/// 博客平台发布客户端
pub struct BlogApiPublisher {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl BlogApiPublisher {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.blog_api_base_url.clone(),
            token: config.blog_api_token.clone(),
        }
    }
}

impl BlogPublisher for BlogApiPublisher {
    fn publish(&self, post: BlogPost) -> BoxFuture<'_, AppResult<PublishReceipt>> {
        Box::pin(async move {
            let endpoint = format!("{}/posts", self.base_url);
            debug!("发布文章: {} (slug={})", post.title, post.slug);

            let payload = json!({
                "title": post.title,
                "slug": post.slug,
                "body": post.body,
                "tags": post.tags,
            });

            let response = self
                .client
                .post(&endpoint)
                .bearer_auth(&self.token)
                .json(&payload)
                .send()
                .await
                .map_err(|e| AppError::publish_failed(&endpoint, e))?;

            let status = response.status();

            // slug 冲突：平台已有同一篇，按幂等跳过处理
            if status.as_u16() == 409 {
                info!("文章已存在，跳过重复发布: {}", post.slug);
                return Ok(PublishReceipt {
                    post_id: post.slug.clone(),
                    duplicate: true,
                });
            }

            if !status.is_success() {
                let message = response.text().await.ok();
                return Err(AppError::Publish(PublishError::BadResponse {
                    endpoint,
                    status: Some(status.as_u16()),
                    message,
                }));
            }

            let parsed: PublishResponse = response
                .json()
                .await
                .map_err(|e| AppError::publish_failed(&endpoint, e))?;

            Ok(PublishReceipt {
                post_id: parsed.id,
                duplicate: false,
            })
        })
    }
}
