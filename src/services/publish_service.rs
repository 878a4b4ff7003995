//! 发布服务 - 业务能力层
//!
//! 只负责"把一篇成稿写到目标平台"能力，不关心流程
//!
//! slug 取选题ID（同题同 slug），平台端据此识别重复投稿；
//! 发布失败时草稿留在任务里，供人工恢复

use crate::error::AppResult;
use crate::infrastructure::{usage_tracker::cost, ApiKind, UsageTracker};
use crate::models::{Draft, GeneratedImage, Topic};
use crate::port::{BlogPost, BlogPublisher, PublishReceipt};
use std::sync::Arc;
use tracing::debug;

/// 发布服务
pub struct PublishService {
    publisher: Arc<dyn BlogPublisher>,
    usage: Arc<UsageTracker>,
}

impl PublishService {
    pub fn new(publisher: Arc<dyn BlogPublisher>, usage: Arc<UsageTracker>) -> Self {
        Self { publisher, usage }
    }

    /// 发布成稿
    pub async fn publish(
        &self,
        topic: &Topic,
        draft: &Draft,
        images: &[GeneratedImage],
        tags: &[String],
    ) -> AppResult<PublishReceipt> {
        // 发布是关键阶段：配额用尽直接失败，不降级
        self.usage.reserve(ApiKind::Publish)?;

        let post = BlogPost {
            title: draft.title.clone(),
            slug: topic.id.clone(),
            body: compose_body(draft, images),
            tags: tags.to_vec(),
        };

        debug!("准备发布: {} (slug={})", post.title, post.slug);
        let receipt = self.publisher.publish(post).await?;
        self.usage.record(ApiKind::Publish, cost::PUBLISH);
        Ok(receipt)
    }
}

/// 把配图按插入位置编入正文（纯函数）
///
/// 正文按二级标题切块，位置 N 表示插在第 N 块之后（0 是文首段）；
/// 越界的位置收到最后一块之后
pub fn compose_body(draft: &Draft, images: &[GeneratedImage]) -> String {
    if images.is_empty() {
        return draft.body.clone();
    }

    // 切块：每个 "## " 标题开启一块，标题前的内容是第 0 块
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in draft.body.lines() {
        if line.starts_with("## ") {
            blocks.push(Vec::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    let last_block = blocks.len() - 1;
    let mut output = String::new();
    for (index, block) in blocks.iter().enumerate() {
        for line in block {
            output.push_str(line);
            output.push('\n');
        }
        for image in images {
            if image.placement_index.min(last_block) == index {
                output.push_str(&format!(
                    "\n![{}]({})\n*图：{}*\n\n",
                    image.alt_text, image.url, image.source_attribution
                ));
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(body: &str) -> Draft {
        Draft {
            job_id: "job-1".to_string(),
            attempt: 1,
            title: "标题".to_string(),
            outline: vec!["一".to_string(), "二".to_string()],
            body: body.to_string(),
            word_count: body.split_whitespace().count(),
        }
    }

    fn image(url: &str, placement_index: usize) -> GeneratedImage {
        GeneratedImage {
            url: url.to_string(),
            alt_text: "示意图".to_string(),
            source_attribution: "摄影师".to_string(),
            placement_index,
        }
    }

    #[test]
    fn test_compose_without_images_is_identity() {
        let d = draft("开头\n## 一\n正文A\n## 二\n正文B");
        assert_eq!(compose_body(&d, &[]), d.body);
    }

    #[test]
    fn test_compose_inserts_after_designated_section() {
        let d = draft("开头\n## 一\n正文A\n## 二\n正文B");
        let output = compose_body(&d, &[image("https://img/1", 1)]);

        let img_pos = output.find("https://img/1").unwrap();
        let section_one = output.find("正文A").unwrap();
        let section_two = output.find("## 二").unwrap();
        assert!(img_pos > section_one && img_pos < section_two);
        assert!(output.contains("*图：摄影师*"));
    }

    #[test]
    fn test_compose_clamps_out_of_range_placement() {
        let d = draft("开头\n## 一\n正文A");
        let output = compose_body(&d, &[image("https://img/9", 99)]);
        // 收到最后一块之后
        assert!(output.trim_end().ends_with("*图：摄影师*"));
    }
}
