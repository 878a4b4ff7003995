//! 资料核查服务 - 业务能力层
//!
//! 只负责"为一个选题收集并交叉核对事实"能力，不关心流程
//!
//! 每条候选事实要求至少一个独立第二来源（不同域名）佐证；
//! 没有佐证的论断保留但降为低置信，由下游收敛措辞，而不是直接丢弃

use crate::error::{AppError, AppResult, ResearchError};
use crate::infrastructure::{usage_tracker::cost, ApiKind, UsageTracker};
use crate::models::{ResearchBundle, ResearchFact, Topic};
use crate::port::{FactSearch, SearchHit};
use crate::services::topic_dedup::keyword_set;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// 关键词上限（选题词 + 检索结果高频词）
const KEYWORD_CAP: usize = 10;
/// 判定佐证所需的最小词重合数
const CORROBORATION_OVERLAP: usize = 2;

/// 资料核查服务
pub struct VerifiedResearch {
    search: Arc<dyn FactSearch>,
    usage: Arc<UsageTracker>,
    max_retries: u32,
    backoff_ms: u64,
    timeout_secs: u64,
    result_limit: usize,
}

impl VerifiedResearch {
    pub fn new(
        config: &crate::config::Config,
        search: Arc<dyn FactSearch>,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            search,
            usage,
            max_retries: config.research_max_retries.max(1),
            backoff_ms: config.research_backoff_ms,
            timeout_secs: config.research_timeout_secs,
            result_limit: config.research_result_limit,
        }
    }

    /// 为选题收集资料
    ///
    /// 检索不可达 / 超时在有限重试（指数退避）后返回错误，
    /// 由流程层决定是否降级为"未核实资料"继续
    pub async fn research(&self, topic: &Topic) -> AppResult<ResearchBundle> {
        debug!("开始检索资料: {}", topic.text);

        // 重试逻辑
        let mut last_err: Option<AppError> = None;
        for retry_count in 0..self.max_retries {
            if retry_count > 0 {
                let backoff = self.backoff_ms * (1u64 << (retry_count - 1));
                warn!(
                    "检索失败 (尝试 {}/{}), 等待 {}ms 后重试...",
                    retry_count, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            self.usage.reserve(ApiKind::FactSearch)?;

            let call = self.search.search(topic.text.clone(), self.result_limit);
            match timeout(Duration::from_secs(self.timeout_secs), call).await {
                Err(_) => {
                    last_err = Some(AppError::Research(ResearchError::Timeout {
                        timeout_secs: self.timeout_secs,
                        attempts: retry_count + 1,
                    }));
                }
                Ok(Err(e)) => {
                    last_err = Some(AppError::Research(ResearchError::Unavailable {
                        attempts: retry_count + 1,
                        source: Box::new(e),
                    }));
                }
                Ok(Ok(hits)) => {
                    self.usage.record(ApiKind::FactSearch, cost::FACT_SEARCH);
                    let bundle = build_bundle(topic, hits);
                    debug!(
                        "资料包完成: {} 条事实, {} 条有佐证, verified={}",
                        bundle.facts.len(),
                        bundle.corroborated_count(),
                        bundle.verified
                    );
                    return Ok(bundle);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AppError::Research(ResearchError::Unavailable {
                attempts: self.max_retries,
                source: "检索服务无响应".into(),
            })
        }))
    }
}

/// 从检索命中构建资料包（纯函数）
pub fn build_bundle(topic: &Topic, hits: Vec<SearchHit>) -> ResearchBundle {
    // 关键词：选题词优先，再补检索结果标题里的词
    let mut keywords: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for word in crate::services::topic_dedup::normalize_topic(&topic.text).split_whitespace() {
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
        }
    }
    for hit in &hits {
        for word in crate::services::topic_dedup::normalize_topic(&hit.title).split_whitespace() {
            if keywords.len() >= KEYWORD_CAP {
                break;
            }
            if seen.insert(word.to_string()) {
                keywords.push(word.to_string());
            }
        }
    }

    let facts: Vec<ResearchFact> = hits
        .iter()
        .filter(|hit| !hit.snippet.trim().is_empty())
        .map(|hit| {
            let corroborated = is_corroborated(hit, &hits);
            ResearchFact {
                claim: hit.snippet.trim().to_string(),
                source: (!hit.url.trim().is_empty()).then(|| hit.url.clone()),
                confidence: if corroborated { 0.9 } else { 0.4 },
                corroborated,
            }
        })
        .collect();

    // 任何一条论断缺来源，整包降为未核实
    let verified = !facts.is_empty() && facts.iter().all(|f| f.source.is_some());

    ResearchBundle {
        topic_id: topic.id.clone(),
        facts,
        keywords,
        verified,
    }
}

/// 交叉核对：是否存在不同域名的另一条命中与本条词重合足够多
fn is_corroborated(hit: &SearchHit, all: &[SearchHit]) -> bool {
    let own_domain = domain_of(&hit.url);
    let own_words = keyword_set(&hit.snippet);
    all.iter().any(|other| {
        let other_domain = domain_of(&other.url);
        !other_domain.is_empty()
            && other_domain != own_domain
            && own_words
                .intersection(&keyword_set(&other.snippet))
                .count()
                >= CORROBORATION_OVERLAP
    })
}

/// 从链接提取域名（取不到时返回空串）
fn domain_of(url: &str) -> String {
    url.trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))
        .unwrap_or(url.trim())
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(snippet: &str, url: &str) -> SearchHit {
        SearchHit {
            title: "title".to_string(),
            snippet: snippet.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://example.com/a/b"), "example.com");
        assert_eq!(domain_of("http://News.Site.org"), "news.site.org");
        assert_eq!(domain_of(""), "");
    }

    #[test]
    fn test_cross_checked_fact_is_corroborated() {
        let topic = Topic::new("rust async runtime", "技术");
        let hits = vec![
            hit("tokio is the most used rust async runtime", "https://a.com/1"),
            hit("the rust async runtime tokio dominates usage", "https://b.org/2"),
        ];
        let bundle = build_bundle(&topic, hits);
        assert_eq!(bundle.facts.len(), 2);
        assert!(bundle.facts.iter().all(|f| f.corroborated));
        assert!(bundle.verified);
        assert_eq!(bundle.corroborated_count(), 2);
    }

    #[test]
    fn test_same_domain_does_not_corroborate() {
        let topic = Topic::new("rust async runtime", "技术");
        let hits = vec![
            hit("tokio is the most used rust async runtime", "https://a.com/1"),
            hit("the rust async runtime tokio dominates usage", "https://a.com/2"),
        ];
        let bundle = build_bundle(&topic, hits);
        assert_eq!(bundle.corroborated_count(), 0);
        // 无佐证不等于未核实：每条都有来源，资料包仍是 verified
        assert!(bundle.verified);
        assert!(bundle.facts.iter().all(|f| f.confidence < 0.5));
    }

    #[test]
    fn test_missing_source_marks_bundle_unverified() {
        let topic = Topic::new("rust async runtime", "技术");
        let hits = vec![hit("some unsourced claim about rust", "")];
        let bundle = build_bundle(&topic, hits);
        assert!(!bundle.verified);
        assert!(bundle.facts[0].source.is_none());
    }

    #[test]
    fn test_empty_hits_give_unverified_bundle() {
        let topic = Topic::new("rust async runtime", "技术");
        let bundle = build_bundle(&topic, Vec::new());
        assert!(bundle.facts.is_empty());
        assert!(!bundle.verified);
        // 关键词仍来自选题本身
        assert!(bundle.keywords.contains(&"rust".to_string()));
    }
}
