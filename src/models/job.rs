//! 发布任务与状态机
//!
//! ## 状态流转
//!
//! ```text
//! Queued → Researching → Drafting → Scoring ─┬→ Finalizing → Published
//!                            ↑               ├→ RewritePending ─┐
//!                            └───────────────┴←─────────────────┘
//! Scoring → Rejected（重写次数耗尽）
//! 任意阶段外部调用失败 → Failed
//! Queued / Scoring → Skipped（选题被并发任务抢先占用）
//! ```
//!
//! 任务在其生命周期内由流程层独占持有，终态只读

use crate::models::content::{Draft, GeneratedImage, QualityScore};
use crate::models::topic::{PublishStatus, Topic};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Researching,
    Drafting,
    Scoring,
    RewritePending,
    Finalizing,
    Published,
    Rejected,
    Skipped,
    Failed,
}

impl JobState {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Published | JobState::Rejected | JobState::Skipped | JobState::Failed
        )
    }

    /// 状态流转是否合法
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Queued, Researching) | (Queued, Skipped) => true,
            (Researching, Drafting) => true,
            (Drafting, Scoring) => true,
            (Scoring, Finalizing)
            | (Scoring, RewritePending)
            | (Scoring, Rejected)
            | (Scoring, Skipped) => true,
            (RewritePending, Drafting) => true,
            (Finalizing, Published) => true,
            // 外部调用失败可以发生在任何非终态阶段
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 发布任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishJob {
    pub id: String,
    pub topic: Topic,
    pub state: JobState,
    /// 已起草次数（首稿计 1）
    pub attempts: u32,
    /// 循环结束后保留的最终草稿
    pub final_draft: Option<Draft>,
    pub images: Vec<GeneratedImage>,
    /// 每稿的评分记录（按时间顺序）
    pub quality_history: Vec<QualityScore>,
    pub error: Option<String>,
}

impl PublishJob {
    /// 创建排队中的任务
    pub fn new(id: impl Into<String>, topic: Topic) -> Self {
        Self {
            id: id.into(),
            topic,
            state: JobState::Queued,
            attempts: 0,
            final_draft: None,
            images: Vec::new(),
            quality_history: Vec::new(),
            error: None,
        }
    }

    /// 状态流转
    ///
    /// 非法流转只告警不中断，避免单个任务把整轮拖垮
    pub fn advance(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            warn!(
                "[任务 {}] ⚠️ 非法状态流转: {} → {}",
                self.id, self.state, next
            );
        }
        self.state = next;
    }

    /// 标记失败并记录原因
    pub fn fail(&mut self, reason: impl std::fmt::Display) {
        self.error = Some(reason.to_string());
        self.advance(JobState::Failed);
    }

    /// 最后一次评分的总分
    pub fn last_score(&self) -> Option<f64> {
        self.quality_history.last().map(|s| s.total_score)
    }

    /// 重写次数（不含首稿）
    pub fn rewrite_attempts(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// 终态对应的历史记录状态
    pub fn publish_status(&self) -> PublishStatus {
        match self.state {
            JobState::Published => PublishStatus::Published,
            JobState::Skipped => PublishStatus::Skipped,
            JobState::Rejected => PublishStatus::Rejected,
            _ => PublishStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> PublishJob {
        PublishJob::new("run1-01", Topic::new("Rust 异步入门", "技术"))
    }

    #[test]
    fn test_happy_path_transitions_are_legal() {
        use JobState::*;
        let chain = [Queued, Researching, Drafting, Scoring, Finalizing, Published];
        for pair in chain.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_rewrite_loop_transitions() {
        use JobState::*;
        assert!(Scoring.can_transition_to(RewritePending));
        assert!(RewritePending.can_transition_to(Drafting));
        assert!(Scoring.can_transition_to(Rejected));
        assert!(Scoring.can_transition_to(Skipped));
    }

    #[test]
    fn test_terminal_states_do_not_transition() {
        use JobState::*;
        for state in [Published, Rejected, Skipped, Failed] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(Failed));
            assert!(!state.can_transition_to(Drafting));
        }
    }

    #[test]
    fn test_failure_allowed_from_any_active_state() {
        use JobState::*;
        for state in [Queued, Researching, Drafting, Scoring, RewritePending, Finalizing] {
            assert!(state.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_fail_records_reason() {
        let mut job = sample_job();
        job.advance(JobState::Researching);
        job.fail("检索服务不可达");
        assert_eq!(job.state, JobState::Failed);
        assert!(job.error.as_deref().unwrap().contains("检索"));
        assert_eq!(job.publish_status(), PublishStatus::Failed);
    }

    #[test]
    fn test_rewrite_attempts_counts_from_second_draft() {
        let mut job = sample_job();
        assert_eq!(job.rewrite_attempts(), 0);
        job.attempts = 2;
        assert_eq!(job.rewrite_attempts(), 1);
    }
}
