//! 会话指标
//!
//! 原子计数器，可以在任何线程安全地读取，不会引入锁竞争。

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 手动控制会话实时指标
///
/// # 使用示例
///
/// ```rust
/// use mecanum_driver::SessionMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(SessionMetrics::default());
/// metrics.control_cycles.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.control_cycles, 1);
/// ```
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// 主控制循环迭代次数
    pub control_cycles: AtomicU64,

    /// 升降循环迭代次数
    pub lift_cycles: AtomicU64,

    /// 接管（trap）次数：只统计 false -> true 的跳变
    pub traps: AtomicU64,

    /// 释放次数：只统计 true -> false 的跳变
    pub releases: AtomicU64,

    /// 限位开关把收回命令归零的次数
    pub limit_clamps: AtomicU64,

    /// 执行器错误次数（轮询循环记录后继续运行）
    pub actuator_errors: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器
    ///
    /// 不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            control_cycles: self.control_cycles.load(Ordering::Relaxed),
            lift_cycles: self.lift_cycles.load(Ordering::Relaxed),
            traps: self.traps.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            limit_clamps: self.limit_clamps.load(Ordering::Relaxed),
            actuator_errors: self.actuator_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.control_cycles.store(0, Ordering::Relaxed);
        self.lift_cycles.store(0, Ordering::Relaxed);
        self.traps.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.limit_clamps.store(0, Ordering::Relaxed);
        self.actuator_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub control_cycles: u64,
    pub lift_cycles: u64,
    pub traps: u64,
    pub releases: u64,
    pub limit_clamps: u64,
    pub actuator_errors: u64,
}
