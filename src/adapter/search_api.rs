//! 事实检索适配器
//!
//! 对接通用 Web 检索 API；超时和重试策略由上层检索服务负责，
//! 这里只做一次请求

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::port::{FactSearch, SearchHit};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    url: String,
}

/// HTTP 检索客户端
pub struct HttpFactSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpFactSearch {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.search_api_base_url.clone(),
            api_key: config.search_api_key.clone(),
        }
    }
}

impl FactSearch for HttpFactSearch {
    fn search(&self, query: String, limit: usize) -> BoxFuture<'_, AppResult<Vec<SearchHit>>> {
        Box::pin(async move {
            let endpoint = format!("{}/search", self.base_url);
            debug!("检索: {} (limit={})", query, limit);

            let response = self
                .client
                .get(&endpoint)
                .query(&[("q", query.as_str()), ("limit", &limit.to_string())])
                .header("X-Api-Key", &self.api_key)
                .send()
                .await
                .map_err(|e| AppError::Other(format!("检索请求失败 ({}): {}", endpoint, e)))?;

            if !response.status().is_success() {
                return Err(AppError::Other(format!(
                    "检索服务返回错误状态 ({}): {}",
                    endpoint,
                    response.status()
                )));
            }

            let parsed: SearchResponse = response
                .json()
                .await
                .map_err(|e| AppError::Other(format!("检索响应解析失败: {}", e)))?;

            let hits = parsed
                .results
                .into_iter()
                .filter(|item| !item.snippet.is_empty())
                .take(limit)
                .map(|item| SearchHit {
                    title: item.title,
                    snippet: item.snippet,
                    url: item.url,
                })
                .collect();

            Ok(hits)
        })
    }
}
