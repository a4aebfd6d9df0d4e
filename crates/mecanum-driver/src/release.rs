//! 接管释放监视器
//!
//! 在独立线程中持续评估释放条件，满足时清除仲裁器的接管标志。
//! 接管必须由主控制循环低延迟置位；释放是另一个可能更慢的条件，
//! 不能阻塞驾驶循环，所以单独运行，并且只写一个布尔值。

use crate::arbiter::OverrideArbiter;
use crate::error::DriverError;
use crate::worker::{PollWorker, StopOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 释放条件
pub type ReleasePredicate = dyn Fn(&OverrideArbiter) -> bool + Send + Sync;

/// 接管释放监视器
///
/// 只持有仲裁器的引用和一个终止标志（在 `PollWorker` 中），没有其他独立状态。
pub struct ReleaseMonitor {
    arbiter: Arc<OverrideArbiter>,
    predicate: Arc<ReleasePredicate>,
    worker: PollWorker,
}

impl ReleaseMonitor {
    /// 使用默认释放条件（副手柄上的释放按钮）
    pub fn new(arbiter: Arc<OverrideArbiter>) -> Self {
        Self::with_predicate(arbiter, OverrideArbiter::release_requested)
    }

    /// 使用自定义释放条件
    pub fn with_predicate<P>(arbiter: Arc<OverrideArbiter>, predicate: P) -> Self
    where
        P: Fn(&OverrideArbiter) -> bool + Send + Sync + 'static,
    {
        Self {
            arbiter,
            predicate: Arc::new(predicate),
            worker: PollWorker::new("release-monitor"),
        }
    }

    /// 评估一次释放条件
    ///
    /// 返回本次是否真正释放了接管。
    pub fn poll(&self) -> bool {
        evaluate(&self.arbiter, self.predicate.as_ref())
    }

    /// 启动后台监视线程；只在 `stop()` 后退出
    pub fn start(&self, period: Duration) -> Result<(), DriverError> {
        let arbiter = self.arbiter.clone();
        let predicate = self.predicate.clone();
        self.worker.start(
            period,
            move || {
                evaluate(&arbiter, predicate.as_ref());
            },
            || {},
        )
    }

    pub fn stop(&self) -> StopOutcome {
        self.worker.stop()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn arbiter(&self) -> &Arc<OverrideArbiter> {
        &self.arbiter
    }
}

fn evaluate(arbiter: &OverrideArbiter, predicate: &ReleasePredicate) -> bool {
    // 未接管时不评估条件，避免无意义的输入读取
    if !arbiter.is_overridden() {
        return false;
    }

    if predicate(arbiter) {
        trace!("Release condition satisfied");
        return arbiter.release();
    }

    false
}

impl std::fmt::Debug for ReleaseMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseMonitor")
            .field("arbiter", &self.arbiter)
            .field("worker", &self.worker)
            .finish()
    }
}
