//! 升降控制
//!
//! 单轴升降电机的独立轮询循环：
//!
//! - 读取两个相反方向的输入（扳机轴或按钮），净命令 = 正向 - 反向，限制到 [-1, 1]
//! - 输入可以直接来自某个手柄，也可以来自 `OverrideArbiter` 当前有效的输入源
//! - 限位开关触发时，收回方向的命令在写入电机之前归零；伸出方向总是放行
//! - `stop()` 保证电机最后收到的命令是 0
//!
//! # 失效安全
//!
//! 归零分两次执行：工作线程在退出循环后、线程结束前写一次 0（覆盖最后一次迭代），
//! `stop()` 在 join 之后再写一次 0（覆盖工作线程 panic 的情况）。
//! 两次写入都是幂等的。

use crate::arbiter::OverrideArbiter;
use crate::error::DriverError;
use crate::events::{self, EventHook, SessionEvent};
use crate::metrics::SessionMetrics;
use crate::worker::{PollWorker, StopOutcome};
use mecanum_hal::{AxisId, ButtonId, InputSource, LiftSink, LimitSwitch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, trace, warn};

/// 升降输入来源
#[derive(Clone)]
pub enum LiftSource {
    /// 固定读取一个手柄
    Direct(Arc<dyn InputSource>),
    /// 每次迭代读取仲裁器当前有效的手柄
    Arbitrated(Arc<OverrideArbiter>),
}

impl LiftSource {
    fn input(&self) -> &dyn InputSource {
        match self {
            LiftSource::Direct(source) => source.as_ref(),
            LiftSource::Arbitrated(arbiter) => arbiter.authoritative_source().as_ref(),
        }
    }
}

impl std::fmt::Debug for LiftSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiftSource::Direct(_) => write!(f, "Direct"),
            LiftSource::Arbitrated(arbiter) => write!(f, "Arbitrated({})", arbiter.authority()),
        }
    }
}

/// 升降输入绑定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LiftBinding {
    /// 两个扳机轴：净命令 = forward - backward
    Triggers {
        forward_axis: AxisId,
        backward_axis: AxisId,
    },
    /// 两个按钮，按下时以固定速度运行
    Buttons {
        up: ButtonId,
        down: ButtonId,
        #[serde(default = "default_lift_speed")]
        speed: f64,
    },
}

/// 按钮绑定的默认升降速度
pub const DEFAULT_LIFT_SPEED: f64 = 1.0;

fn default_lift_speed() -> f64 {
    DEFAULT_LIFT_SPEED
}

impl LiftBinding {
    /// 按当前输入计算净命令（未经限位处理）
    pub fn net_command(&self, input: &dyn InputSource) -> f64 {
        let (forward, backward) = match *self {
            LiftBinding::Triggers {
                forward_axis,
                backward_axis,
            } => (input.axis(forward_axis), input.axis(backward_axis)),
            LiftBinding::Buttons { up, down, speed } => {
                let speed = speed.abs();
                let f = if input.button(up) { speed } else { 0.0 };
                let b = if input.button(down) { speed } else { 0.0 };
                (f, b)
            },
        };

        // 两个方向同时满行程时对称抵消为 0
        let net = forward - backward;
        if net.is_nan() { 0.0 } else { net.clamp(-1.0, 1.0) }
    }
}

/// 收回方向（限位开关所在的方向）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetractDirection {
    /// 负命令为收回
    #[default]
    Negative,
    /// 正命令为收回
    Positive,
}

impl RetractDirection {
    /// `command` 是否朝收回方向运动
    pub fn is_retracting(&self, command: f64) -> bool {
        match self {
            RetractDirection::Negative => command < 0.0,
            RetractDirection::Positive => command > 0.0,
        }
    }
}

struct LiftInner {
    source: LiftSource,
    binding: LiftBinding,
    motor: Arc<dyn LiftSink>,
    limit: Arc<dyn LimitSwitch>,
    retract: RetractDirection,
    /// 上一次迭代是否被限位归零（只在进入归零状态时发布事件）
    clamping: AtomicBool,
    metrics: Option<Arc<SessionMetrics>>,
    events: Option<EventHook>,
}

impl LiftInner {
    fn compute(&self) -> f64 {
        self.binding.net_command(self.source.input())
    }

    fn apply_limit(&self, command: f64) -> f64 {
        if self.retract.is_retracting(command) && self.limit.is_triggered() {
            trace!(requested = command, "Lift limit engaged, retract command dropped");
            if let Some(m) = &self.metrics {
                m.limit_clamps.fetch_add(1, Ordering::Relaxed);
            }
            if !self.clamping.swap(true, Ordering::Relaxed) {
                events::publish(&self.events, SessionEvent::LimitEngaged { requested: command });
            }
            return 0.0;
        }
        self.clamping.store(false, Ordering::Relaxed);
        command
    }

    fn step(&self) -> Result<f64, DriverError> {
        let command = self.apply_limit(self.compute());
        self.motor.set_speed(command)?;
        Ok(command)
    }

    fn tick(&self) {
        if let Err(e) = self.step() {
            warn!("Lift command failed: {}", e);
            if let Some(m) = &self.metrics {
                m.actuator_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        if let Some(m) = &self.metrics {
            m.lift_cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn zero(&self) {
        if let Err(e) = self.motor.set_speed(0.0) {
            error!("Failed to zero lift motor: {}", e);
        }
    }
}

/// 升降控制器
pub struct LiftController {
    inner: Arc<LiftInner>,
    worker: PollWorker,
}

impl LiftController {
    /// 创建升降控制器
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 按钮绑定的速度不是有限数，或两个方向绑定到同一个轴/按钮
    pub fn new(
        source: LiftSource,
        binding: LiftBinding,
        motor: Arc<dyn LiftSink>,
        limit: Arc<dyn LimitSwitch>,
        retract: RetractDirection,
    ) -> Result<Self, DriverError> {
        match binding {
            LiftBinding::Triggers {
                forward_axis,
                backward_axis,
            } if forward_axis == backward_axis => {
                return Err(DriverError::InvalidConfig(format!(
                    "lift forward and backward must use distinct axes ({})",
                    forward_axis
                )));
            },
            LiftBinding::Buttons { up, down, .. } if up == down => {
                return Err(DriverError::InvalidConfig(format!(
                    "lift up and down must use distinct buttons ({})",
                    up
                )));
            },
            LiftBinding::Buttons { speed, .. } if !speed.is_finite() || speed.abs() > 1.0 => {
                return Err(DriverError::InvalidConfig(format!(
                    "lift speed must be within [-1, 1], got {}",
                    speed
                )));
            },
            _ => {},
        }

        Ok(Self {
            inner: Arc::new(LiftInner {
                source,
                binding,
                motor,
                limit,
                retract,
                clamping: AtomicBool::new(false),
                metrics: None,
                events: None,
            }),
            worker: PollWorker::new("lift").realtime(true),
        })
    }

    /// 挂接指标（必须在 `start()` 之前调用）
    pub fn with_metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.metrics = Some(metrics);
        }
        self
    }

    /// 挂接事件钩子（必须在 `start()` 之前调用）
    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.events = Some(hook);
        }
        self
    }

    /// 按当前输入计算净命令（未经限位处理）
    pub fn compute(&self) -> f64 {
        self.inner.compute()
    }

    /// 限位处理：限位触发时收回方向的命令归零
    pub fn apply_limit(&self, command: f64) -> f64 {
        self.inner.apply_limit(command)
    }

    /// 执行一次迭代：计算、限位、写入电机，返回实际写入的命令
    pub fn step(&self) -> Result<f64, DriverError> {
        self.inner.step()
    }

    /// 启动升降循环
    ///
    /// 执行器错误不会终止循环：记录 `warn!` 并计入 `actuator_errors`。
    pub fn start(&self, period: Duration) -> Result<(), DriverError> {
        let tick_inner = self.inner.clone();
        let exit_inner = self.inner.clone();
        self.worker.start(
            period,
            move || tick_inner.tick(),
            move || exit_inner.zero(),
        )?;
        info!(source = ?self.inner.source, "Lift loop started");
        Ok(())
    }

    /// 停止升降循环
    ///
    /// 总是成功；返回时工作线程已退出，电机最后收到的命令为 0。
    pub fn stop(&self) -> StopOutcome {
        let outcome = self.worker.stop();
        if outcome != StopOutcome::NotRunning {
            self.inner.zero();
            info!(?outcome, "Lift loop stopped");
        }
        outcome
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn binding(&self) -> LiftBinding {
        self.inner.binding
    }

    pub fn retract_direction(&self) -> RetractDirection {
        self.inner.retract
    }
}

impl std::fmt::Debug for LiftController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiftController")
            .field("source", &self.inner.source)
            .field("binding", &self.inner.binding)
            .field("retract", &self.inner.retract)
            .field("worker", &self.worker)
            .finish()
    }
}
