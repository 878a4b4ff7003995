//! 用量跟踪器 - 基础设施层
//!
//! 持有本轮运行的配额计数，只暴露"预占/提交/查询"能力
//!
//! 并发任务共用同一个跟踪器，检查和计数必须在同一个临界区里完成
//! （先预占再调用，失败归还），否则两个任务可能同时通过检查而超额

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::UsageRecord;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::debug;

/// 外部 API 调用类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    /// LLM 文本补全
    LlmCompletion,
    /// 事实检索
    FactSearch,
    /// 图库检索
    ImageFetch,
    /// 发布平台写入
    Publish,
}

impl ApiKind {
    pub const ALL: [ApiKind; 4] = [
        ApiKind::LlmCompletion,
        ApiKind::FactSearch,
        ApiKind::ImageFetch,
        ApiKind::Publish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiKind::LlmCompletion => "llm_completion",
            ApiKind::FactSearch => "fact_search",
            ApiKind::ImageFetch => "image_fetch",
            ApiKind::Publish => "publish",
        }
    }
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 单次调用成本估算（美元）
pub mod cost {
    pub const LLM_COMPLETION: f64 = 0.01;
    pub const FACT_SEARCH: f64 = 0.002;
    pub const IMAGE_FETCH: f64 = 0.001;
    pub const PUBLISH: f64 = 0.0005;
}

#[derive(Debug, Default)]
struct UsageState {
    calls: HashMap<ApiKind, u64>,
    cost: f64,
}

/// 用量跟踪器（每轮运行一个）
pub struct UsageTracker {
    run_id: String,
    quotas: HashMap<ApiKind, u64>,
    state: Mutex<UsageState>,
}

impl UsageTracker {
    pub fn new(run_id: impl Into<String>, config: &Config) -> Self {
        let mut quotas = HashMap::new();
        quotas.insert(ApiKind::LlmCompletion, config.quota_llm_calls);
        quotas.insert(ApiKind::FactSearch, config.quota_search_calls);
        quotas.insert(ApiKind::ImageFetch, config.quota_image_calls);
        quotas.insert(ApiKind::Publish, config.quota_publish_calls);
        Self {
            run_id: run_id.into(),
            quotas,
            state: Mutex::new(UsageState::default()),
        }
    }

    fn quota(&self, kind: ApiKind) -> u64 {
        self.quotas.get(&kind).copied().unwrap_or(0)
    }

    /// 再发起 `extra` 次调用是否会超额（只读，不占名额）
    pub fn would_exceed(&self, kind: ApiKind, extra: u64) -> bool {
        let state = self.state.lock().expect("用量锁中毒");
        let used = state.calls.get(&kind).copied().unwrap_or(0);
        used + extra > self.quota(kind)
    }

    /// 预占一次调用名额（检查 + 计数在同一临界区）
    ///
    /// 超额时返回 `QuotaExceeded`，调用方不得再发起请求
    pub fn reserve(&self, kind: ApiKind) -> AppResult<()> {
        let mut state = self.state.lock().expect("用量锁中毒");
        let used = state.calls.entry(kind).or_insert(0);
        if *used + 1 > self.quota(kind) {
            return Err(AppError::quota_exceeded(kind.as_str(), self.quota(kind)));
        }
        *used += 1;
        debug!("预占 {} 名额: {}/{}", kind, *used, self.quota(kind));
        Ok(())
    }

    /// 归还一次预占（调用未实际发出时）
    pub fn release(&self, kind: ApiKind) {
        let mut state = self.state.lock().expect("用量锁中毒");
        if let Some(used) = state.calls.get_mut(&kind) {
            *used = used.saturating_sub(1);
        }
    }

    /// 调用完成后提交成本估算
    pub fn record(&self, kind: ApiKind, cost: f64) {
        let mut state = self.state.lock().expect("用量锁中毒");
        state.cost += cost;
        debug!("记录 {} 成本: +{:.4}", kind, cost);
    }

    /// 剩余名额
    pub fn remaining_quota(&self, kind: ApiKind) -> u64 {
        let state = self.state.lock().expect("用量锁中毒");
        let used = state.calls.get(&kind).copied().unwrap_or(0);
        self.quota(kind).saturating_sub(used)
    }

    /// 导出本轮台账
    pub fn snapshot(&self) -> UsageRecord {
        let state = self.state.lock().expect("用量锁中毒");
        let mut api_calls_by_kind = BTreeMap::new();
        for kind in ApiKind::ALL {
            let used = state.calls.get(&kind).copied().unwrap_or(0);
            if used > 0 {
                api_calls_by_kind.insert(kind.as_str().to_string(), used);
            }
        }
        UsageRecord {
            run_id: self.run_id.clone(),
            api_calls_by_kind,
            cost_estimate: state.cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn tracker_with_quota(llm: u64) -> UsageTracker {
        let config = Config {
            quota_llm_calls: llm,
            ..Config::default()
        };
        UsageTracker::new("test-run", &config)
    }

    #[test]
    fn test_reserve_until_exhausted() {
        let tracker = tracker_with_quota(2);
        assert!(tracker.reserve(ApiKind::LlmCompletion).is_ok());
        assert!(tracker.reserve(ApiKind::LlmCompletion).is_ok());
        let err = tracker.reserve(ApiKind::LlmCompletion).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(tracker.remaining_quota(ApiKind::LlmCompletion), 0);
    }

    #[test]
    fn test_release_returns_slot() {
        let tracker = tracker_with_quota(1);
        tracker.reserve(ApiKind::LlmCompletion).unwrap();
        assert!(tracker.would_exceed(ApiKind::LlmCompletion, 1));
        tracker.release(ApiKind::LlmCompletion);
        assert!(!tracker.would_exceed(ApiKind::LlmCompletion, 1));
        assert!(tracker.reserve(ApiKind::LlmCompletion).is_ok());
    }

    #[test]
    fn test_snapshot_collects_cost_and_counts() {
        let tracker = tracker_with_quota(10);
        tracker.reserve(ApiKind::LlmCompletion).unwrap();
        tracker.record(ApiKind::LlmCompletion, 0.01);
        tracker.reserve(ApiKind::LlmCompletion).unwrap();
        tracker.record(ApiKind::LlmCompletion, 0.01);

        let record = tracker.snapshot();
        assert_eq!(record.api_calls_by_kind["llm_completion"], 2);
        assert!((record.cost_estimate - 0.02).abs() < 1e-9);
    }

    /// 并发预占下剩余名额不得为负，计数不得超过配额
    #[tokio::test]
    async fn test_concurrent_reserve_never_exceeds_quota() {
        let quota = 10u64;
        let tracker = Arc::new(tracker_with_quota(quota));

        let mut handles = Vec::new();
        for _ in 0..40 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.reserve(ApiKind::LlmCompletion).is_ok()
            }));
        }

        let mut granted = 0u64;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, quota);
        assert_eq!(tracker.remaining_quota(ApiKind::LlmCompletion), 0);
        assert_eq!(tracker.snapshot().api_calls_by_kind["llm_completion"], quota);
    }
}
