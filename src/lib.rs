//! # Auto Blog Publish
//!
//! 一个按固定周期自动生成并发布博客文章的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 端口与适配器（Port / Adapter）
//! - `port/` - 外部协作方的 trait 接口（LLM、检索、图库、发布平台）
//! - `adapter/` - 生产实现（async-openai / reqwest）
//!
//! ### ② 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有跨任务共享的稀缺资源，只暴露能力
//! - `HistoryStore` - 发布历史 + 本轮选题占用表
//! - `UsageTracker` - 单轮配额计数（预占/提交/归还）
//! - `RunLock` - 单轮运行锁
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇文章
//! - `TopicGenerator` / `TopicDeduplicator` - 选题与查重能力
//! - `VerifiedResearch` - 资料检索与交叉核对能力
//! - `ContentGenerator` / `QualityScorer` - 起草与评分能力
//! - `ImageService` / `PublishService` - 配图与发布能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文章"的完整处理流程
//! - `JobCtx` - 上下文封装（run_id + job_index）
//! - `PublishFlow` - 流程编排（检索 → 起草评分循环 → 复检 → 配图 → 发布）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/scheduler` - 运行调度器，管理单轮互斥、并发和统计
//! - `orchestrator/topic_selection` - 选题筛选，凑够数量或轮数封顶
//!
//! ### ⑥ 触发层（API）
//! - `api/` - 带共享密钥的 HTTP 触发端点，定时与手动共用一个契约
//!
//! ## 模块结构

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod port;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ApiKind, HistoryStore, RunLock, UsageTracker};
pub use models::{PublishJob, RunMode, RunReport, Topic};
pub use orchestrator::App;
pub use workflow::{JobCtx, PublishFlow};
