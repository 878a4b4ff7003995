//! 单轮运行锁 - 基础设施层
//!
//! 同一时刻最多一轮运行在进行：后到的触发直接拒绝，
//! 不排队也不静默丢弃，避免配额被重复消耗和选题竞争

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 运行锁
#[derive(Clone, Default)]
pub struct RunLock {
    active: Arc<AtomicBool>,
}

/// 持锁凭据，Drop 时自动释放
pub struct RunGuard {
    active: Arc<AtomicBool>,
}

impl RunLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试上锁；已有运行在进行时返回 None
    pub fn try_acquire(&self) -> Option<RunGuard> {
        let acquired = self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        acquired.then(|| RunGuard {
            active: self.active.clone(),
        })
    }

    /// 是否有运行在进行
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
