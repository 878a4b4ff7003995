//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `scheduler` - 运行调度器
//! - 管理应用生命周期（初始化、定时循环、HTTP 触发）
//! - 单轮互斥（RunLock）与总时限
//! - 控制并发数量（Semaphore）
//! - 汇总 RunReport，落盘历史与用量台账
//!
//! ### `topic_selection` - 选题筛选
//! - 反复拉候选、查重过滤，直到凑够数量或轮数封顶
//! - 不足额时带着现有选题开跑，绝不阻塞
//!
//! ## 层次关系
//!
//! ```text
//! scheduler (处理一轮 Vec<Topic>)
//!     ↓
//! workflow::PublishFlow (处理单个 Topic)
//!     ↓
//! services (能力层：topic / research / content / score / image / publish)
//!     ↓
//! port + adapter (外部协作方) / infrastructure (共享资源)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：scheduler 管批量，PublishFlow 管单篇
//! 2. **失败隔离**：单任务失败装进报告，不向上炸掉整轮
//! 3. **向下依赖**：编排层 → workflow → services → port/infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体内容判断

pub mod scheduler;
pub mod topic_selection;

// 重新导出主要类型
pub use scheduler::App;
pub use topic_selection::select_topics;
