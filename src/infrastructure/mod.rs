//! 基础设施层（Infrastructure Layer）
//!
//! 持有跨任务共享的稀缺资源，只暴露能力：
//! - `HistoryStore` - 发布历史文件（跨运行存活）+ 本轮选题占用表
//! - `UsageTracker` - 本轮配额计数（预占/提交/归还）
//! - `RunLock` - 单轮运行锁
//!
//! 运行锁和用量计数是全系统仅有的跨任务共享可变状态，
//! 临界区都收得很小（一次比较交换 / 一次哈希表更新）

pub mod history_store;
pub mod run_lock;
pub mod usage_tracker;

pub use history_store::{append_usage_record, HistoryStore};
pub use run_lock::{RunGuard, RunLock};
pub use usage_tracker::{ApiKind, UsageTracker};
