//! 发布流程 - 流程层
//!
//! 核心职责：定义"一篇文章"的完整处理流程
//!
//! 流程顺序：
//! 1. 检索资料（失败可降级为未核实继续）
//! 2. 起草 → 评分循环（带纠错反馈，次数封顶）
//! 3. 发布前选题复检（并发竞争转 Skipped）
//! 4. 配图（软失败）→ 发布
//!
//! 任何结局都返回完整的 PublishJob，错误装在 job.error 里，
//! 绝不向上抛异常拖垮同轮的其他任务

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{HistoryStore, UsageTracker};
use crate::models::{
    Draft, JobState, PublishJob, ResearchBundle, StyleProfile, Topic, Verdict,
};
use crate::port::{BlogPublisher, FactSearch, ImageLookup};
use crate::services::topic_dedup::normalize_topic;
use crate::services::{
    ContentGenerator, ImageService, LlmService, PublishService, QualityScorer, VerifiedResearch,
};
use crate::utils::logging::truncate_text;
use crate::workflow::job_ctx::JobCtx;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 发布流程
///
/// - 编排单篇文章的完整处理流程
/// - 决定何时检索、何时重写、何时放弃
/// - 不持有运行锁，不做批量统计
/// - 只依赖业务能力（services）
pub struct PublishFlow {
    research: VerifiedResearch,
    content: ContentGenerator,
    scorer: QualityScorer,
    images: ImageService,
    publisher: PublishService,
    history: Arc<HistoryStore>,
    max_draft_attempts: u32,
    verbose_logging: bool,
}

impl PublishFlow {
    /// 创建新的发布流程
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &Config,
        llm: LlmService,
        search: Arc<dyn FactSearch>,
        image_lookup: Arc<dyn ImageLookup>,
        blog: Arc<dyn BlogPublisher>,
        history: Arc<HistoryStore>,
        usage: Arc<UsageTracker>,
        profiles: &[StyleProfile],
    ) -> AppResult<Self> {
        Ok(Self {
            research: VerifiedResearch::new(config, search, usage.clone()),
            content: ContentGenerator::new(config, llm.clone(), profiles)?,
            scorer: QualityScorer::new(llm, config.score_weights, config.quality_threshold),
            images: ImageService::new(config, image_lookup, usage.clone()),
            publisher: PublishService::new(blog, usage),
            history,
            max_draft_attempts: config.max_draft_attempts.max(1),
            verbose_logging: config.verbose_logging,
        })
    }

    /// 处理一个选题到终态
    pub async fn run(&self, topic: Topic, ctx: &JobCtx) -> PublishJob {
        let mut job = PublishJob::new(ctx.job_id(), topic.clone());
        log_topic_start(ctx, &topic);

        // ========== 阶段 1: 检索资料 ==========
        job.advance(JobState::Researching);
        info!("[任务 {}] 🔍 正在检索资料...", ctx.job_index);

        let bundle = match self.research.research(&topic).await {
            Ok(bundle) => {
                info!(
                    "[任务 {}] ✓ 资料就绪: {} 条事实, {} 条有佐证",
                    ctx.job_index,
                    bundle.facts.len(),
                    bundle.corroborated_count()
                );
                if self.verbose_logging {
                    log_facts(ctx.job_index, &bundle);
                }
                bundle
            }
            Err(e) if e.is_degradable_research() => {
                warn!(
                    "[任务 {}] ⚠️ 检索降级，以未核实资料继续: {}",
                    ctx.job_index, e
                );
                let keywords = normalize_topic(&topic.text)
                    .split_whitespace()
                    .map(|w| w.to_string())
                    .collect();
                ResearchBundle::unverified(topic.id.clone(), keywords)
            }
            Err(e) => {
                error!("[任务 {}] ❌ 检索失败: {}", ctx.job_index, e);
                job.fail(e);
                return job;
            }
        };

        // ========== 阶段 2: 起草-评分循环 ==========
        job.advance(JobState::Drafting);

        let accepted: Draft = loop {
            let attempt = job.attempts + 1;
            let feedback = job.quality_history.last().cloned();

            info!(
                "[任务 {}] ✍️ 正在起草第 {}/{} 稿...",
                ctx.job_index, attempt, self.max_draft_attempts
            );
            let draft = match self
                .content
                .generate(&topic, &bundle, &job.id, attempt, feedback.as_ref())
                .await
            {
                Ok(draft) => draft,
                Err(e) => {
                    error!("[任务 {}] ❌ 起草失败: {}", ctx.job_index, e);
                    job.fail(e);
                    return job;
                }
            };
            job.attempts = attempt;

            job.advance(JobState::Scoring);
            let score = match self.scorer.score(&draft, &bundle).await {
                Ok(score) => score,
                Err(e) => {
                    error!("[任务 {}] ❌ 评分失败: {}", ctx.job_index, e);
                    job.fail(e);
                    return job;
                }
            };

            info!(
                "[任务 {}] 第 {} 稿得分: {:.1} ({:?})",
                ctx.job_index, attempt, score.total_score, score.verdict
            );
            let verdict = score.verdict;
            job.quality_history.push(score);

            match verdict {
                Verdict::Accept => break draft,
                _ => {
                    if job.attempts >= self.max_draft_attempts {
                        warn!(
                            "[任务 {}] ⚠️ 重写 {} 次仍未达标，放弃发布",
                            ctx.job_index,
                            job.rewrite_attempts()
                        );
                        job.final_draft = Some(draft);
                        job.advance(JobState::Rejected);
                        return job;
                    }
                    info!("[任务 {}] 🔁 未达标，带评分反馈重写", ctx.job_index);
                    job.advance(JobState::RewritePending);
                    job.advance(JobState::Drafting);
                }
            }
        };

        // ========== 阶段 3: 发布前选题复检 ==========
        // 选题入选时不重复，不代表现在还不重复：并发任务可能已经抢先
        if !self.history.try_claim(&normalize_topic(&topic.text)) {
            info!(
                "[任务 {}] ⤵️ 选题已被并发任务抢先，跳过发布: {}",
                ctx.job_index, topic.text
            );
            job.final_draft = Some(accepted);
            job.advance(JobState::Skipped);
            return job;
        }
        job.advance(JobState::Finalizing);

        // ========== 阶段 4: 配图（软失败）与发布 ==========
        job.images = self.images.attach_images(&accepted, &bundle.keywords).await;
        if !job.images.is_empty() {
            info!("[任务 {}] 🖼️ 配图 {} 张", ctx.job_index, job.images.len());
        }

        let mut tags: Vec<String> = bundle.keywords.iter().take(5).cloned().collect();
        if !topic.category.is_empty() {
            tags.push(topic.category.clone());
        }

        match self
            .publisher
            .publish(&topic, &accepted, &job.images, &tags)
            .await
        {
            Ok(receipt) => {
                if receipt.duplicate {
                    info!(
                        "[任务 {}] 平台已存在同 slug 文章，按幂等处理",
                        ctx.job_index
                    );
                }
                info!("[任务 {}] ✅ 发布成功: {}", ctx.job_index, accepted.title);
                job.final_draft = Some(accepted);
                job.advance(JobState::Published);
            }
            Err(e) => {
                error!("[任务 {}] ❌ 发布失败: {}", ctx.job_index, e);
                // 草稿保留在任务里，供人工恢复
                job.final_draft = Some(accepted);
                job.fail(e);
            }
        }

        job
    }
}

// ========== 日志辅助函数 ==========

fn log_topic_start(ctx: &JobCtx, topic: &Topic) {
    info!("\n[任务 {}] {}", ctx.job_index, "─".repeat(30));
    info!(
        "[任务 {}] 开始处理选题: {} (类目: {})",
        ctx.job_index,
        truncate_text(&topic.text, 40),
        topic.category
    );
}

fn log_facts(job_index: usize, bundle: &ResearchBundle) {
    for (i, fact) in bundle.facts.iter().take(2).enumerate() {
        info!(
            "[任务 {}]   {}. {} (置信度: {:.1})",
            job_index,
            i + 1,
            truncate_text(&fact.claim, 60),
            fact.confidence
        );
    }
}
