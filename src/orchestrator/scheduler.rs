//! 运行调度器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一轮运行的全生命周期。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：装配适配器、加载发布历史和风格画像
//! 2. **单轮互斥**：运行锁保证同一时刻最多一轮在跑，后到的触发直接拒绝
//! 3. **选题筛选**：委托 topic_selection 凑齐本轮选题
//! 4. **并发控制**：使用 Semaphore 限制同时处理的任务数量
//! 5. **总时限**：超出时间预算的任务按超时失败记录，不拖累已完成的
//! 6. **全局统计**：汇总所有任务结果成 RunReport，落盘用量台账
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单篇文章的细节
//! - **部分失败可交付**：任何一轮都产出报告，失败装在每个任务的 error 里
//! - **向下委托**：委托 workflow::PublishFlow 处理单个选题

use crate::api;
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError, ScheduleError};
use crate::infrastructure::{append_usage_record, HistoryStore, RunLock, UsageTracker};
use crate::models::{
    HistoryEntry, PublishJob, RunMode, RunReport, StyleProfile, Topic,
};
use crate::orchestrator::topic_selection;
use crate::port::{BlogPublisher, FactSearch, ImageLookup, TextCompletion};
use crate::services::{LlmService, TopicDeduplicator, TopicGenerator};
use crate::workflow::{JobCtx, PublishFlow};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    llm: Arc<dyn TextCompletion>,
    search: Arc<dyn FactSearch>,
    image_lookup: Arc<dyn ImageLookup>,
    blog: Arc<dyn BlogPublisher>,
    history: Arc<HistoryStore>,
    profiles: Vec<StyleProfile>,
    run_lock: RunLock,
    run_seq: AtomicU64,
}

impl App {
    /// 初始化应用（装配生产适配器）
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let llm: Arc<dyn TextCompletion> =
            Arc::new(crate::adapter::OpenAiCompletion::new(&config));
        let search: Arc<dyn FactSearch> = Arc::new(crate::adapter::HttpFactSearch::new(&config));
        let image_lookup: Arc<dyn ImageLookup> =
            Arc::new(crate::adapter::StockImageApi::new(&config));
        let blog: Arc<dyn BlogPublisher> = Arc::new(crate::adapter::BlogApiPublisher::new(&config));

        Self::with_collaborators(config, llm, search, image_lookup, blog).await
    }

    /// 用外部传入的协作方装配应用（测试注入桩实现的入口）
    pub async fn with_collaborators(
        config: Config,
        llm: Arc<dyn TextCompletion>,
        search: Arc<dyn FactSearch>,
        image_lookup: Arc<dyn ImageLookup>,
        blog: Arc<dyn BlogPublisher>,
    ) -> Result<Self> {
        let history = Arc::new(
            HistoryStore::load(&config.history_file).context("加载发布历史失败")?,
        );
        let profiles = crate::models::load_profile_corpus(&config.style_profiles_file)
            .await
            .context("加载风格画像失败")?;

        Ok(Self {
            config,
            llm,
            search,
            image_lookup,
            blog,
            history,
            profiles,
            run_lock: RunLock::new(),
            run_seq: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 校验触发令牌
    ///
    /// 失败的请求在这里就被挡下，不产生任何副作用
    pub fn authorize(&self, token: Option<&str>) -> AppResult<()> {
        match token {
            None => Err(AppError::Auth(AuthError::MissingToken)),
            Some(t) if t == self.config.trigger_token => Ok(()),
            Some(_) => Err(AppError::Auth(AuthError::InvalidToken)),
        }
    }

    /// 触发一轮运行
    ///
    /// 同一时刻只允许一轮：已有运行在进行时立即返回 `RunAlreadyActive`，
    /// 不产生任何副作用（不消耗配额、不写台账）
    pub async fn trigger_run(&self, requested: usize, mode: RunMode) -> AppResult<RunReport> {
        let _guard = self
            .run_lock
            .try_acquire()
            .ok_or(AppError::Schedule(ScheduleError::RunAlreadyActive))?;

        let run_id = format!(
            "run-{}-{:03}",
            Utc::now().format("%Y%m%d%H%M%S"),
            self.run_seq.fetch_add(1, Ordering::Relaxed)
        );
        log_run_start(&run_id, mode, requested);

        let usage = Arc::new(UsageTracker::new(&run_id, &self.config));
        self.history.begin_run();

        // ========== 选题 ==========
        let llm_service = LlmService::new(&self.config, self.llm.clone(), usage.clone());
        let generator = TopicGenerator::new(llm_service.clone());
        let dedup = TopicDeduplicator::new(
            self.history.clone(),
            self.config.dedup_window_days,
            self.config.similarity_threshold,
        );

        let topics =
            match topic_selection::select_topics(&self.config, &generator, &dedup, requested).await
            {
                Ok(topics) => topics,
                Err(e) => {
                    // 选题阶段已经消耗了配额，台账照记
                    self.persist_usage(&usage);
                    error!("❌ 选题阶段失败，本轮中止: {}", e);
                    return Err(e);
                }
            };

        if topics.is_empty() {
            info!("没有可用选题，本轮空跑结束");
            self.persist_usage(&usage);
            return Ok(RunReport::assemble(&run_id, mode, requested, &[]));
        }

        // ========== 并发处理所有任务 ==========
        let jobs = self
            .process_all_topics(&run_id, topics, llm_service, usage.clone())
            .await?;

        // ========== 落历史、落台账、汇总报告 ==========
        for job in &jobs {
            let entry = HistoryEntry::new(&job.topic, job.publish_status());
            if let Err(e) = self.history.append(entry) {
                error!("[任务 {}] 历史写入失败: {}", job.id, e);
            }
        }
        self.persist_usage(&usage);

        let report = RunReport::assemble(&run_id, mode, requested, &jobs);
        log_run_complete(&report);
        Ok(report)
    }

    /// 并发跑完本轮所有选题
    async fn process_all_topics(
        &self,
        run_id: &str,
        topics: Vec<Topic>,
        llm_service: LlmService,
        usage: Arc<UsageTracker>,
    ) -> AppResult<Vec<PublishJob>> {
        let flow = Arc::new(PublishFlow::new(
            &self.config,
            llm_service,
            self.search.clone(),
            self.image_lookup.clone(),
            self.blog.clone(),
            self.history.clone(),
            usage,
            &self.profiles,
        )?);

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_jobs.max(1)));
        // 总时限从开跑起算，覆盖整轮任务
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.run_timeout_secs);
        let budget_secs = self.config.run_timeout_secs;

        let mut handles = Vec::new();
        for (idx, topic) in topics.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AppError::Other(format!("并发信号量已关闭: {}", e)))?;

            let flow = flow.clone();
            let ctx = JobCtx::new(run_id, idx + 1);
            let topic_for_timeout = topic.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match tokio::time::timeout_at(deadline, flow.run(topic, &ctx)).await {
                    Ok(job) => job,
                    Err(_) => {
                        // 到点仍卡在外部调用里的任务按超时失败记录
                        let mut job = PublishJob::new(ctx.job_id(), topic_for_timeout);
                        job.fail(AppError::Schedule(ScheduleError::RunTimeout { budget_secs }));
                        job
                    }
                }
            });
            handles.push((idx + 1, handle));
        }

        // 等待本轮所有任务完成（完成顺序不保证）
        let mut jobs = Vec::new();
        for (job_index, handle) in handles {
            match handle.await {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    error!("[任务 {}] 任务执行失败: {}", job_index, e);
                }
            }
        }
        Ok(jobs)
    }

    fn persist_usage(&self, usage: &UsageTracker) {
        let record = usage.snapshot();
        if let Err(e) = append_usage_record(&self.config.usage_file, &record) {
            error!("用量台账写入失败: {}", e);
        }
    }

    /// 定时循环：每个周期触发一轮
    ///
    /// 启动后立即跑第一轮；单轮失败不自动重试，下一个周期就是重试
    pub async fn run_on_cadence(self: Arc<Self>) -> Result<()> {
        let period = Duration::from_secs(self.config.cadence_hours.max(1) * 3600);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self
                .trigger_run(self.config.default_post_count, RunMode::Scheduled)
                .await
            {
                Ok(report) => {
                    info!(
                        "✅ 定时运行完成: 成功 {}/{}",
                        report.success_count, report.requested_count
                    );
                }
                Err(e) if e.is_run_already_active() => {
                    warn!("⚠️ 上一轮仍在进行，本周期跳过");
                }
                Err(e) => {
                    error!("❌ 定时运行失败: {} (等待下一周期)", e);
                }
            }
        }
    }

    /// 启动 HTTP 触发端点并进入定时循环
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("无法监听 {}", self.config.listen_addr))?;
        info!("🌐 触发端点就绪: http://{}/v1/publish/trigger", self.config.listen_addr);

        let router = api::router(self.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("HTTP 服务退出: {}", e);
            }
        });

        let result = self.run_on_cadence().await;
        server.abort();
        result
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动博客发布流水线");
    info!("📊 最大并发任务数: {}", config.max_parallel_jobs);
    info!("⏰ 触发周期: 每 {} 小时", config.cadence_hours);
    info!("🎯 质量线: {:.0} 分 / 最多 {} 稿", config.quality_threshold, config.max_draft_attempts);
    info!("{}", "=".repeat(60));
}

fn log_run_start(run_id: &str, mode: RunMode, requested: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始新一轮运行: {} ({})", run_id, mode);
    info!("📄 目标篇数: {}", requested);
    info!("{}", "=".repeat(60));
}

fn log_run_complete(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 本轮运行完成: {}", report.run_id);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", report.success_count, report.requested_count);
    info!("📈 平均质量分: {:.1}", report.average_quality_score);
    for job in &report.jobs {
        match &job.error {
            Some(err) => info!("  ❌ {} [{}]: {}", job.title, job.state, err),
            None => info!(
                "  ✓ {} [{}] 质量 {:.1} / 配图 {} / 重写 {}",
                job.title, job.state, job.quality_score, job.images_inserted, job.rewrite_attempts
            ),
        }
    }
    info!("{}", "=".repeat(60));
}
