//! 控制权仲裁（接管 / 释放）
//!
//! 持有两个输入源（主手柄、副手柄）和一个接管标志：
//!
//! - `trap()`：无条件置位接管标志（幂等），由主控制循环低延迟调用
//! - `release()`：清除接管标志，由 `ReleaseMonitor` 在后台线程调用
//! - `authoritative_source()`：接管时返回副手柄，否则返回主手柄
//!
//! 接管标志是唯一一个有两个写者的共享单元，因此使用原子 `swap`，
//! 不会丢失更新。
//!
//! `OverrideArbiter` 本身也实现了 `InputSource`：读数总是来自当前有效的输入源，
//! 可以直接交给 `OrientationState` 或 `LiftController` 使用。

use crate::events::{self, EventHook, SessionEvent};
use crate::metrics::SessionMetrics;
use mecanum_hal::{AxisId, ButtonId, InputSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 当前控制权归属
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    /// 主手柄（驾驶员）
    Primary,
    /// 副手柄（接管者）
    Secondary,
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authority::Primary => write!(f, "primary"),
            Authority::Secondary => write!(f, "secondary"),
        }
    }
}

/// 控制权仲裁器
pub struct OverrideArbiter {
    primary: Arc<dyn InputSource>,
    secondary: Arc<dyn InputSource>,
    overridden: AtomicBool,
    /// 主手柄上的接管按钮
    trap_button: ButtonId,
    /// 副手柄上的释放按钮
    release_button: ButtonId,
    metrics: Option<Arc<SessionMetrics>>,
    events: Option<EventHook>,
}

impl OverrideArbiter {
    pub fn new(
        primary: Arc<dyn InputSource>,
        secondary: Arc<dyn InputSource>,
        trap_button: ButtonId,
        release_button: ButtonId,
    ) -> Self {
        Self {
            primary,
            secondary,
            overridden: AtomicBool::new(false),
            trap_button,
            release_button,
            metrics: None,
            events: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        self.events = Some(hook);
        self
    }

    /// 接管：无条件置位接管标志
    ///
    /// 幂等：连续调用两次与调用一次效果相同（指标和事件只记录一次跳变）。
    pub fn trap(&self) {
        let was = self.overridden.swap(true, Ordering::AcqRel);
        if !was {
            info!("Override trapped: secondary source is now authoritative");
            if let Some(m) = &self.metrics {
                m.traps.fetch_add(1, Ordering::Relaxed);
            }
            events::publish(&self.events, SessionEvent::Trapped);
        }
    }

    /// 释放：清除接管标志
    ///
    /// 返回本次调用是否真正发生了 true -> false 跳变。
    pub fn release(&self) -> bool {
        let was = self.overridden.swap(false, Ordering::AcqRel);
        if was {
            info!("Override released: primary source is authoritative again");
            if let Some(m) = &self.metrics {
                m.releases.fetch_add(1, Ordering::Relaxed);
            }
            events::publish(&self.events, SessionEvent::Released);
        }
        was
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden.load(Ordering::Acquire)
    }

    /// 当前控制权归属
    pub fn authority(&self) -> Authority {
        if self.is_overridden() {
            Authority::Secondary
        } else {
            Authority::Primary
        }
    }

    /// 当前有效的输入源
    pub fn authoritative_source(&self) -> &Arc<dyn InputSource> {
        self.source(self.authority())
    }

    pub fn source(&self, authority: Authority) -> &Arc<dyn InputSource> {
        match authority {
            Authority::Primary => &self.primary,
            Authority::Secondary => &self.secondary,
        }
    }

    pub fn primary(&self) -> &Arc<dyn InputSource> {
        &self.primary
    }

    pub fn secondary(&self) -> &Arc<dyn InputSource> {
        &self.secondary
    }

    /// 采样主手柄上的接管按钮，按下则接管
    ///
    /// 返回按钮是否按下。由主控制循环每个周期调用一次。
    pub fn poll_trap(&self) -> bool {
        let pressed = self.primary.button(self.trap_button);
        if pressed {
            self.trap();
        }
        pressed
    }

    /// 默认释放条件：副手柄上的释放按钮按下
    pub fn release_requested(&self) -> bool {
        self.secondary.button(self.release_button)
    }

    pub fn trap_button(&self) -> ButtonId {
        self.trap_button
    }

    pub fn release_button(&self) -> ButtonId {
        self.release_button
    }
}

impl InputSource for OverrideArbiter {
    fn axis(&self, id: AxisId) -> f64 {
        self.authoritative_source().axis(id)
    }

    fn button(&self, id: ButtonId) -> bool {
        self.authoritative_source().button(id)
    }
}

impl std::fmt::Debug for OverrideArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideArbiter")
            .field("authority", &self.authority())
            .field("trap_button", &self.trap_button)
            .field("release_button", &self.release_button)
            .finish()
    }
}
