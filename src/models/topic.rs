//! 选题与发布历史
//!
//! Topic 一经创建不可变；HistoryEntry 只追加不修改，
//! 重试不会悄悄重复同一个选题

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 候选选题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// 选题ID（由规范化标题派生，同题同ID）
    pub id: String,
    /// 选题标题
    pub text: String,
    /// 类目
    pub category: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Topic {
    /// 创建新选题
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: topic_id(&text),
            text,
            category: category.into(),
            created_at: Utc::now(),
        }
    }
}

/// 由选题标题派生确定性ID
///
/// 相同标题（大小写、空白差异除外）落到同一个ID，
/// 发布端以该ID做 slug，重复发布可被平台识别为同一篇
pub fn topic_id(text: &str) -> String {
    let normalized: String = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    format!("t{:016x}", hasher.finish())
}

/// 任务最终状态（写入发布历史）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStatus {
    /// 已发布
    Published,
    /// 重复跳过
    Skipped,
    /// 质量门未过
    Rejected,
    /// 处理失败
    Failed,
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishStatus::Published => "published",
            PublishStatus::Skipped => "skipped",
            PublishStatus::Rejected => "rejected",
            PublishStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// 发布历史记录（只追加）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub topic_id: String,
    pub topic_text: String,
    pub published_at: DateTime<Utc>,
    pub status: PublishStatus,
}

impl HistoryEntry {
    pub fn new(topic: &Topic, status: PublishStatus) -> Self {
        Self {
            topic_id: topic.id.clone(),
            topic_text: topic.text.clone(),
            published_at: Utc::now(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_id_is_deterministic() {
        assert_eq!(topic_id("Rust 异步入门"), topic_id("Rust 异步入门"));
        // 大小写与空白差异不影响ID
        assert_eq!(topic_id("Async  Rust"), topic_id("async rust"));
    }

    #[test]
    fn test_topic_id_differs_for_different_text() {
        assert_ne!(topic_id("Rust 异步入门"), topic_id("Go 并发入门"));
    }

    #[test]
    fn test_new_topic_carries_id() {
        let topic = Topic::new("Rust 异步入门", "技术");
        assert_eq!(topic.id, topic_id("Rust 异步入门"));
        assert_eq!(topic.category, "技术");
    }
}
