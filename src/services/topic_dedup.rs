//! 选题查重服务 - 业务能力层
//!
//! 只负责"这个选题最近是否做过"的判断，不关心流程
//!
//! 比较口径：规范化标题（小写、折叠空白、去停用词）完全相同，
//! 或关键词 Jaccard 重合度达到阈值，二者任一即视为重复

use crate::infrastructure::HistoryStore;
use crate::models::Topic;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// 停用词表（中英混合，选题标题里常见的虚词）
static STOP_WORDS: phf::Set<&'static str> = phf::phf_set! {
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "for",
    "with", "is", "are", "how", "what", "why", "your", "you",
    "的", "了", "在", "是", "和", "与", "及", "或", "之", "从",
    "如何", "什么", "为什么", "一个", "关于",
};

/// 规范化选题标题：小写、去标点、折叠空白、去停用词
pub fn normalize_topic(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 规范化后的关键词集合
pub fn keyword_set(text: &str) -> HashSet<String> {
    normalize_topic(text)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Jaccard 重合度（两个集合都为空时记 0）
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// 选题查重服务
pub struct TopicDeduplicator {
    history: Arc<HistoryStore>,
    window_days: i64,
    threshold: f64,
}

impl TopicDeduplicator {
    pub fn new(history: Arc<HistoryStore>, window_days: i64, threshold: f64) -> Self {
        Self {
            history,
            window_days,
            threshold,
        }
    }

    /// 两个标题是否视为同一选题
    pub fn similar(&self, a: &str, b: &str) -> bool {
        let norm_a = normalize_topic(a);
        let norm_b = normalize_topic(b);
        if !norm_a.is_empty() && norm_a == norm_b {
            return true;
        }
        jaccard(&keyword_set(a), &keyword_set(b)) >= self.threshold
    }

    /// 选题是否与窗口内的历史记录重复
    ///
    /// 历史里所有状态都算数：失败过的选题短期内也不重试，
    /// 避免同一个坑每轮都踩一遍
    pub fn is_duplicate(&self, topic: &Topic) -> bool {
        for entry in self.history.recent(self.window_days) {
            if self.similar(&topic.text, &entry.topic_text) {
                debug!(
                    "选题与历史记录重复: '{}' ≈ '{}'",
                    topic.text, entry.topic_text
                );
                return true;
            }
        }
        false
    }

    /// 选题是否与本批已接受的选题重复（批内查重）
    pub fn collides_with(&self, topic: &Topic, accepted: &[Topic]) -> bool {
        accepted.iter().any(|t| self.similar(&topic.text, &t.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryEntry, PublishStatus};

    fn store() -> (tempfile::TempDir, Arc<HistoryStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(HistoryStore::load(dir.path().join("history.json")).unwrap());
        (dir, store)
    }

    fn dedup(history: Arc<HistoryStore>) -> TopicDeduplicator {
        TopicDeduplicator::new(history, 30, 0.6)
    }

    #[test]
    fn test_normalize_folds_case_whitespace_and_stopwords() {
        assert_eq!(
            normalize_topic("How  to Learn   RUST"),
            normalize_topic("how to learn rust")
        );
        assert_eq!(normalize_topic("The Rust Book!"), "rust book");
    }

    #[test]
    fn test_jaccard_overlap() {
        let a = keyword_set("rust async runtime tokio");
        let b = keyword_set("rust async runtime basics");
        let sim = jaccard(&a, &b);
        assert!(sim > 0.5 && sim < 1.0);
        assert!((jaccard(&a, &a) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicate_against_history() {
        let (_dir, history) = store();
        let published = Topic::new("Rust async runtime deep dive", "技术");
        history
            .append(HistoryEntry::new(&published, PublishStatus::Published))
            .unwrap();

        let dedup = dedup(history);
        assert!(dedup.is_duplicate(&Topic::new("rust ASYNC runtime  deep dive", "技术")));
        assert!(!dedup.is_duplicate(&Topic::new("Postgres indexing cookbook", "技术")));
    }

    #[test]
    fn test_old_entries_fall_out_of_window() {
        let (_dir, history) = store();
        let topic = Topic::new("Rust async runtime deep dive", "技术");
        let mut entry = HistoryEntry::new(&topic, PublishStatus::Published);
        entry.published_at = chrono::Utc::now() - chrono::Duration::days(90);
        history.append(entry).unwrap();

        let dedup = dedup(history);
        assert!(!dedup.is_duplicate(&topic));
    }

    /// 查重器自洽：经它过滤后的记录两两都不重复
    #[test]
    fn test_self_consistency_within_window() {
        let (_dir, history) = store();
        let dedup = dedup(history.clone());

        let candidates = [
            "Rust async runtime deep dive",
            "rust Async  Runtime deep dive",
            "Postgres indexing cookbook",
            "Writing CLI tools in Go",
            "postgres indexing cookbook",
        ];
        for text in candidates {
            let topic = Topic::new(text, "技术");
            if !dedup.is_duplicate(&topic) {
                history
                    .append(HistoryEntry::new(&topic, PublishStatus::Published))
                    .unwrap();
            }
        }

        let entries = history.recent(30);
        assert_eq!(entries.len(), 3);
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                assert!(
                    !dedup.similar(&a.topic_text, &b.topic_text),
                    "窗口内出现重复: '{}' / '{}'",
                    a.topic_text,
                    b.topic_text
                );
            }
        }
    }
}
