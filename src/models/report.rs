//! 运行报告与用量台账
//!
//! RunReport 是一轮运行返回给调用方的唯一产物：
//! 无论多少任务失败，报告里的计数都必须准确，
//! 调用方靠每个任务的 error 字段区分"没得发"和"全失败"

use crate::models::job::{JobState, PublishJob};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// 定时触发
    Scheduled,
    /// 手动触发
    Manual,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Scheduled => write!(f, "scheduled"),
            RunMode::Manual => write!(f, "manual"),
        }
    }
}

/// 单任务摘要（进入对外 JSON，字段名用 camelCase）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub topic_id: String,
    pub title: String,
    pub state: JobState,
    pub quality_score: f64,
    pub images_inserted: usize,
    pub rewrite_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSummary {
    pub fn from_job(job: &PublishJob) -> Self {
        let title = job
            .final_draft
            .as_ref()
            .map(|d| d.title.clone())
            .unwrap_or_else(|| job.topic.text.clone());
        Self {
            topic_id: job.topic.id.clone(),
            title,
            state: job.state,
            quality_score: job.last_score().unwrap_or(0.0),
            images_inserted: job.images.len(),
            rewrite_attempts: job.rewrite_attempts(),
            error: job.error.clone(),
        }
    }
}

/// 一轮运行的报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub mode: RunMode,
    pub requested_count: usize,
    pub success_count: usize,
    pub average_quality_score: f64,
    pub jobs: Vec<JobSummary>,
}

impl RunReport {
    /// 汇总任务结果生成报告
    ///
    /// 任务按选题ID排序，保证输出确定（完成顺序不保证）
    pub fn assemble(
        run_id: impl Into<String>,
        mode: RunMode,
        requested_count: usize,
        jobs: &[PublishJob],
    ) -> Self {
        let success_count = jobs
            .iter()
            .filter(|j| j.state == JobState::Published)
            .count();

        let scored: Vec<f64> = jobs.iter().filter_map(|j| j.last_score()).collect();
        let average_quality_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };

        let mut summaries: Vec<JobSummary> = jobs.iter().map(JobSummary::from_job).collect();
        summaries.sort_by(|a, b| a.topic_id.cmp(&b.topic_id));

        Self {
            run_id: run_id.into(),
            mode,
            requested_count,
            success_count,
            average_quality_score,
            jobs: summaries,
        }
    }
}

/// 单轮用量台账（运行结束时落盘）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub run_id: String,
    pub api_calls_by_kind: BTreeMap<String, u64>,
    pub cost_estimate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::topic::Topic;

    #[test]
    fn test_assemble_counts_and_sorts() {
        let mut a = PublishJob::new("r-1", Topic::new("zzz 排后面", "技术"));
        a.state = JobState::Published;
        let mut b = PublishJob::new("r-2", Topic::new("aaa 排前面", "技术"));
        b.state = JobState::Failed;
        b.error = Some("发布请求失败".to_string());

        let report = RunReport::assemble("run-1", RunMode::Manual, 2, &[a.clone(), b.clone()]);
        assert_eq!(report.requested_count, 2);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.jobs.len(), 2);
        // 按选题ID排序，与完成顺序无关
        let sorted: Vec<_> = {
            let mut ids = vec![a.topic.id.clone(), b.topic.id.clone()];
            ids.sort();
            ids
        };
        assert_eq!(report.jobs[0].topic_id, sorted[0]);
        assert!(report.jobs.iter().any(|j| j.error.is_some()));
    }

    #[test]
    fn test_average_ignores_unscored_jobs() {
        use crate::models::content::{QualityScore, Verdict};
        use std::collections::BTreeMap;

        let mut scored = PublishJob::new("r-1", Topic::new("有评分", "技术"));
        scored.state = JobState::Published;
        scored.quality_history.push(QualityScore {
            draft_attempt: 1,
            total_score: 80.0,
            subscores: BTreeMap::new(),
            verdict: Verdict::Accept,
        });
        let mut unscored = PublishJob::new("r-2", Topic::new("没评分", "技术"));
        unscored.state = JobState::Failed;

        let report = RunReport::assemble("run-1", RunMode::Scheduled, 2, &[scored, unscored]);
        assert!((report.average_quality_score - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_camel_case_serialization() {
        let report = RunReport::assemble("run-1", RunMode::Manual, 0, &[]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("successCount").is_some());
        assert!(json.get("averageQualityScore").is_some());
    }
}
