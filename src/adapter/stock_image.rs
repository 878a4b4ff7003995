//! 图库适配器
//!
//! 对接 Pexels 风格的免费图库 API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::port::{ImageLookup, StockImage};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    alt: String,
    #[serde(default)]
    photographer: String,
    src: PhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PhotoSrc {
    large: String,
}

/// 图库检索客户端
pub struct StockImageApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StockImageApi {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.image_api_base_url.clone(),
            api_key: config.image_api_key.clone(),
        }
    }
}

impl ImageLookup for StockImageApi {
    fn find_images(
        &self,
        keywords: Vec<String>,
        count: usize,
    ) -> BoxFuture<'_, AppResult<Vec<StockImage>>> {
        Box::pin(async move {
            let endpoint = format!("{}/search", self.base_url);
            let query = keywords.join(" ");
            debug!("图库检索: {} (count={})", query, count);

            let response = self
                .client
                .get(&endpoint)
                .query(&[("query", query.as_str()), ("per_page", &count.to_string())])
                .header("Authorization", &self.api_key)
                .send()
                .await
                .map_err(|e| AppError::Other(format!("图库请求失败 ({}): {}", endpoint, e)))?;

            if !response.status().is_success() {
                return Err(AppError::Other(format!(
                    "图库服务返回错误状态 ({}): {}",
                    endpoint,
                    response.status()
                )));
            }

            let parsed: PhotoSearchResponse = response
                .json()
                .await
                .map_err(|e| AppError::Other(format!("图库响应解析失败: {}", e)))?;

            let images = parsed
                .photos
                .into_iter()
                .take(count)
                .map(|photo| StockImage {
                    url: photo.src.large,
                    alt_text: photo.alt,
                    attribution: photo.photographer,
                })
                .collect();

            Ok(images)
        })
    }
}
