//! 速度缩放状态
//!
//! 两个按钮（增大 / 减小）各绑定一个 `DebouncedToggle`，每个边沿把缩放系数
//! 按固定步长调整一次，并在每次调整后限制到 [0, 1]。

use crate::cell::AtomicF64;
use crate::error::DriverError;
use crate::events::{self, EventHook, SessionEvent};
use crate::toggle::DebouncedToggle;
use crate::worker::{PollWorker, StopOutcome};
use mecanum_hal::{ButtonId, InputSource};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::debug;

/// 默认步长
pub const DEFAULT_SCALE_STEP: f64 = 0.10;

/// 把步长结果对齐到 1e-9，避免 0.1 的累加误差让 0.4 + 5 * 0.1 变成 0.8999999
fn settle(value: f64) -> f64 {
    ((value * 1e9).round() / 1e9).clamp(0.0, 1.0)
}

struct ScaleSampler {
    increase: DebouncedToggle,
    decrease: DebouncedToggle,
}

struct ScaleInner {
    source: Arc<dyn InputSource>,
    increase_button: ButtonId,
    decrease_button: ButtonId,
    step: f64,
    sampler: Mutex<ScaleSampler>,
    scale: AtomicF64,
    events: Option<EventHook>,
}

impl ScaleInner {
    fn apply(&self, delta: f64) -> f64 {
        let prev = self
            .scale
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| settle(s + delta));
        let next = settle(prev + delta);
        if next != prev {
            debug!(scale = next, "Drive scale changed");
            events::publish(&self.events, SessionEvent::ScaleChanged { scale: next });
        }
        next
    }

    fn poll(&self) -> f64 {
        let up = self.source.button(self.increase_button);
        let down = self.source.button(self.decrease_button);

        let (inc, dec) = {
            let mut sampler = self.sampler.lock();
            (sampler.increase.poll_edge(up), sampler.decrease.poll_edge(down))
        };

        if inc {
            self.apply(self.step);
        }
        if dec {
            self.apply(-self.step);
        }

        self.scale.load(Ordering::Acquire)
    }
}

/// 速度缩放状态
pub struct ScaleState {
    inner: Arc<ScaleInner>,
    worker: PollWorker,
}

impl ScaleState {
    /// 创建缩放状态
    ///
    /// 初始值按 `|initial|` 取值并限制到 [0, 1]。
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 步长不是有限正数，或初始值不是有限数
    pub fn new(
        source: Arc<dyn InputSource>,
        increase_button: ButtonId,
        decrease_button: ButtonId,
        initial: f64,
        step: f64,
    ) -> Result<Self, DriverError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "scale step must be a positive finite number, got {}",
                step
            )));
        }
        if !initial.is_finite() {
            return Err(DriverError::InvalidConfig(format!(
                "initial scale must be finite, got {}",
                initial
            )));
        }
        if increase_button == decrease_button {
            return Err(DriverError::InvalidConfig(format!(
                "scale increase and decrease must use distinct buttons ({})",
                increase_button
            )));
        }

        Ok(Self {
            inner: Arc::new(ScaleInner {
                source,
                increase_button,
                decrease_button,
                step,
                sampler: Mutex::new(ScaleSampler {
                    increase: DebouncedToggle::default(),
                    decrease: DebouncedToggle::default(),
                }),
                scale: AtomicF64::new(settle(initial.abs())),
                events: None,
            }),
            worker: PollWorker::new("scale"),
        })
    }

    /// 挂接事件钩子（必须在 `start()` 之前调用）
    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.events = Some(hook);
        }
        self
    }

    /// 采样一次两个按钮，返回更新后的缩放系数
    pub fn poll(&self) -> f64 {
        self.inner.poll()
    }

    /// 最近一次计算出的缩放系数（始终在 [0, 1] 内）
    pub fn get(&self) -> f64 {
        self.inner.scale.load(Ordering::Acquire)
    }

    pub fn step(&self) -> f64 {
        self.inner.step
    }

    /// 直接增大一个步长（等价于一次增大边沿）
    pub fn increase(&self) -> f64 {
        self.inner.apply(self.inner.step)
    }

    /// 直接减小一个步长（等价于一次减小边沿）
    pub fn decrease(&self) -> f64 {
        self.inner.apply(-self.inner.step)
    }

    pub fn start(&self, period: Duration) -> Result<(), DriverError> {
        let inner = self.inner.clone();
        self.worker.start(
            period,
            move || {
                inner.poll();
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
}

impl std::fmt::Debug for ScaleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaleState")
            .field("scale", &self.get())
            .field("step", &self.inner.step)
            .field("worker", &self.worker)
            .finish()
    }
}
