//! 配图服务 - 业务能力层
//!
//! 只负责"给成稿挑图"能力，不关心流程
//!
//! 软失败：图库不可达或配额用尽都只是让文章无图发布，不影响任务成败。
//! 插入位置沿章节均匀分布，不会全部挤在文首；同一篇内不重复用图

use crate::config::Config;
use crate::infrastructure::{usage_tracker::cost, ApiKind, UsageTracker};
use crate::models::{Draft, GeneratedImage};
use crate::port::{ImageLookup, StockImage};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// 配图服务
pub struct ImageService {
    images: Arc<dyn ImageLookup>,
    usage: Arc<UsageTracker>,
    per_post: usize,
}

impl ImageService {
    pub fn new(config: &Config, images: Arc<dyn ImageLookup>, usage: Arc<UsageTracker>) -> Self {
        Self {
            images,
            usage,
            per_post: config.images_per_post,
        }
    }

    /// 为成稿挑选并定位配图
    ///
    /// 任何失败都返回空列表，由调用方无图发布
    pub async fn attach_images(&self, draft: &Draft, keywords: &[String]) -> Vec<GeneratedImage> {
        if self.per_post == 0 {
            return Vec::new();
        }

        if let Err(e) = self.usage.reserve(ApiKind::ImageFetch) {
            warn!("图库配额用尽，本篇无图发布: {}", e);
            return Vec::new();
        }

        // 多拉一倍候选，给相关性排序和去重留余量
        let candidates = match self
            .images
            .find_images(keywords.to_vec(), self.per_post * 2)
            .await
        {
            Ok(candidates) => {
                self.usage.record(ApiKind::ImageFetch, cost::IMAGE_FETCH);
                candidates
            }
            Err(e) => {
                warn!("图库不可达，本篇无图发布: {}", e);
                return Vec::new();
            }
        };

        let selected = select_images(candidates, keywords, self.per_post, draft.outline.len());
        debug!("配图完成: {} 张", selected.len());
        selected
    }
}

/// 按关键词相关性选图并分配插入位置（纯函数）
pub fn select_images(
    candidates: Vec<StockImage>,
    keywords: &[String],
    count: usize,
    section_count: usize,
) -> Vec<GeneratedImage> {
    // 同一篇内不重复用图
    let mut seen = HashSet::new();
    let mut unique: Vec<StockImage> = candidates
        .into_iter()
        .filter(|img| !img.url.trim().is_empty() && seen.insert(img.url.clone()))
        .collect();

    // 相关性：alt 文本与关键词的命中数，降序稳定排序
    unique.sort_by_key(|img| std::cmp::Reverse(relevance(img, keywords)));
    unique.truncate(count);

    let placements = spread_placements(section_count, unique.len());
    unique
        .into_iter()
        .zip(placements)
        .map(|(img, placement_index)| GeneratedImage {
            url: img.url,
            alt_text: img.alt_text,
            source_attribution: img.attribution,
            placement_index,
        })
        .collect()
}

fn relevance(image: &StockImage, keywords: &[String]) -> usize {
    let alt = image.alt_text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.is_empty() && alt.contains(&kw.to_lowercase()))
        .count()
}

/// 沿章节均匀分布插入位置（纯函数）
///
/// 位置从 1 开始（0 是文首），两两不同且递增
pub fn spread_placements(section_count: usize, image_count: usize) -> Vec<usize> {
    if image_count == 0 {
        return Vec::new();
    }
    // 章节太少时按图片数撑开，保证位置互不相同
    let sections = section_count.max(image_count).max(1);
    let step = sections / image_count;
    (0..image_count).map(|i| 1 + i * step.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(url: &str, alt: &str) -> StockImage {
        StockImage {
            url: url.to_string(),
            alt_text: alt.to_string(),
            attribution: "photographer".to_string(),
        }
    }

    #[test]
    fn test_spread_never_puts_all_at_top() {
        let placements = spread_placements(6, 3);
        assert_eq!(placements, vec![1, 3, 5]);
        assert!(placements.iter().all(|p| *p > 0));
    }

    #[test]
    fn test_spread_placements_are_distinct() {
        for sections in 0..8 {
            for count in 1..5 {
                let placements = spread_placements(sections, count);
                let unique: HashSet<_> = placements.iter().collect();
                assert_eq!(unique.len(), placements.len(), "sections={}", sections);
            }
        }
    }

    #[test]
    fn test_select_prefers_relevant_images() {
        let keywords = vec!["rust".to_string(), "async".to_string()];
        let candidates = vec![
            img("https://img/1", "a cat sleeping"),
            img("https://img/2", "rust async runtime diagram"),
            img("https://img/3", "rust logo"),
        ];
        let selected = select_images(candidates, &keywords, 2, 5);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].url, "https://img/2");
        assert_eq!(selected[1].url, "https://img/3");
    }

    #[test]
    fn test_select_deduplicates_urls() {
        let keywords = vec!["rust".to_string()];
        let candidates = vec![
            img("https://img/1", "rust"),
            img("https://img/1", "rust again"),
            img("https://img/2", "rust"),
        ];
        let selected = select_images(candidates, &keywords, 3, 4);
        assert_eq!(selected.len(), 2);
    }
}
