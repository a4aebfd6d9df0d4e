//! 手动控制会话（组合根）
//!
//! 一个会话独占一组组件：`OrientationState`、`ScaleState`、`LiftController`，
//! 以及（非 `Standard` 模式下）`OverrideArbiter` + `ReleaseMonitor`。
//!
//! # 生命周期
//!
//! - `start()`：按 朝向 → 缩放 → 升降 → 释放监视 的顺序启动后台循环
//! - `tick()`：执行一个控制周期（接管采样、读取一次快照、缓冲三个轴、下发底盘命令）
//! - `run()`：以固定周期重复 `tick()`，直到外部标志清零或会话被 `stop()`
//! - `stop()`：按相反顺序停止，最后下发中性底盘命令；总是成功。
//!   中性命令在 `run()` 当前周期结束之后写入，之后 `run()` 不会再下发命令
//!
//! 会话被 drop 时自动调用 `stop()`。

use crate::arbiter::{Authority, OverrideArbiter};
use crate::buffer::buffer;
use crate::config::{SessionConfig, TeleopMode};
use crate::error::DriverError;
use crate::events::EventHook;
use crate::lift::{LiftController, LiftSource};
use crate::metrics::SessionMetrics;
use crate::orientation::OrientationState;
use crate::release::ReleaseMonitor;
use crate::scale::ScaleState;
use mecanum_hal::{AxisId, DriveCommand, DriveSink, InputSource, LiftSink, LimitSwitch};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, trace, warn};

/// 会话使用的外部设备
#[derive(Clone)]
pub struct Devices {
    /// 主手柄（驾驶员）
    pub primary: Arc<dyn InputSource>,
    /// 副手柄（操作员 / 接管者）
    pub secondary: Arc<dyn InputSource>,
    pub drive: Arc<dyn DriveSink>,
    pub lift: Arc<dyn LiftSink>,
    /// 升降收回方向的限位开关
    pub lift_limit: Arc<dyn LimitSwitch>,
}

/// 单个控制周期使用的一致快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveSnapshot {
    pub inverted: bool,
    pub scale: f64,
    pub authority: Authority,
}

/// 手动控制会话
pub struct TeleopSession {
    config: SessionConfig,
    primary: Arc<dyn InputSource>,
    drive: Arc<dyn DriveSink>,
    arbiter: Option<Arc<OverrideArbiter>>,
    orientation: OrientationState,
    scale: ScaleState,
    lift: LiftController,
    release: Option<ReleaseMonitor>,
    metrics: Arc<SessionMetrics>,
    started: AtomicBool,
    /// `run()` 每个周期持有；`stop()` 持有它写中性命令
    cycle: Mutex<()>,
}

impl TeleopSession {
    /// 按配置组装会话（不启动任何循环）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置校验失败
    pub fn new(config: SessionConfig, devices: Devices) -> Result<Self, DriverError> {
        Self::build(config, devices, None)
    }

    /// 同 `new()`，并把所有组件的状态跳变发布到事件钩子
    pub fn with_event_hook(
        config: SessionConfig,
        devices: Devices,
        hook: EventHook,
    ) -> Result<Self, DriverError> {
        Self::build(config, devices, Some(hook))
    }

    fn build(
        config: SessionConfig,
        devices: Devices,
        hook: Option<EventHook>,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let Devices {
            primary,
            secondary,
            drive,
            lift,
            lift_limit,
        } = devices;
        let metrics = Arc::new(SessionMetrics::new());
        let buttons = config.buttons;

        let arbiter = if config.mode.uses_arbiter() {
            let mut arbiter =
                OverrideArbiter::new(primary.clone(), secondary.clone(), buttons.trap, buttons.release)
                    .with_metrics(metrics.clone());
            if let Some(hook) = &hook {
                arbiter = arbiter.with_event_hook(hook.clone());
            }
            Some(Arc::new(arbiter))
        } else {
            None
        };

        // 访客模式下朝向由当前有效的手柄控制
        let orientation_source: Arc<dyn InputSource> = match (&arbiter, config.mode) {
            (Some(arbiter), TeleopMode::Guest) => arbiter.clone(),
            _ => primary.clone(),
        };
        let lift_source = match &arbiter {
            Some(arbiter) => LiftSource::Arbitrated(arbiter.clone()),
            None => LiftSource::Direct(secondary.clone()),
        };

        let mut orientation = OrientationState::new(
            orientation_source,
            buttons.orientation,
            config.drive.initially_inverted,
        );
        let mut scale = ScaleState::new(
            primary.clone(),
            buttons.scale_up,
            buttons.scale_down,
            config.initial_scale(),
            config.drive.scale_step,
        )?;
        let mut lift = LiftController::new(
            lift_source,
            config.lift.binding,
            lift,
            lift_limit,
            config.lift.retract,
        )?
        .with_metrics(metrics.clone());

        if let Some(hook) = hook {
            orientation = orientation.with_event_hook(hook.clone());
            scale = scale.with_event_hook(hook.clone());
            lift = lift.with_event_hook(hook);
        }

        let release = arbiter.as_ref().map(|a| ReleaseMonitor::new(a.clone()));

        Ok(Self {
            config,
            primary,
            drive,
            arbiter,
            orientation,
            scale,
            lift,
            release,
            metrics,
            started: AtomicBool::new(false),
            cycle: Mutex::new(()),
        })
    }

    /// 启动所有后台循环
    ///
    /// 任何一个循环启动失败时，已启动的循环会被停止，然后返回错误。
    pub fn start(&self) -> Result<(), DriverError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(DriverError::AlreadyRunning("teleop session"));
        }

        let period = self.config.period();
        let result = self
            .orientation
            .start(period)
            .and_then(|()| self.scale.start(period))
            .and_then(|()| self.lift.start(period))
            .and_then(|()| match &self.release {
                Some(release) => release.start(period),
                None => Ok(()),
            });

        if let Err(e) = result {
            error!("Failed to start teleop session: {}", e);
            self.stop();
            return Err(e);
        }

        info!(
            mode = %self.config.mode,
            period_ms = self.config.period_ms,
            "Teleop session started"
        );
        Ok(())
    }

    /// 读取本周期的一致快照（每个共享值只读一次）
    pub fn snapshot(&self) -> DriveSnapshot {
        DriveSnapshot {
            inverted: self.orientation.get(),
            scale: self.scale.get(),
            authority: self.authority(),
        }
    }

    /// 执行一个控制周期，返回下发的底盘命令
    pub fn tick(&self) -> Result<DriveCommand, DriverError> {
        if let Some(arbiter) = &self.arbiter {
            arbiter.poll_trap();
        }

        let snap = self.snapshot();
        let source = match (&self.arbiter, self.config.mode) {
            (Some(arbiter), TeleopMode::Guest) => arbiter.source(snap.authority),
            _ => &self.primary,
        };

        let drive = &self.config.drive;
        let dz = drive.dead_zone;
        let axis = |id: AxisId, inverted: bool| {
            buffer(source.axis(id), inverted, dz.low, dz.high, snap.scale)
        };

        let command = DriveCommand::new(
            axis(drive.x_axis, snap.inverted),
            axis(drive.y_axis, snap.inverted),
            axis(drive.rotation_axis, drive.invert_rotation),
        );
        trace!(?command, ?snap, "Control cycle");

        self.metrics.control_cycles.fetch_add(1, Ordering::Relaxed);
        self.drive.drive(command)?;
        Ok(command)
    }

    /// 以固定周期运行控制循环，直到 `running` 变为 false 或会话被停止
    ///
    /// 单个周期的执行器错误只记录日志，不终止循环。
    /// 会话未启动时立即返回；返回时不会自动 `stop()`。
    pub fn run(&self, running: &AtomicBool) {
        let period = self.config.period();
        let mut next = Instant::now();

        while running.load(Ordering::Acquire) {
            {
                let _cycle = self.cycle.lock();
                // 持锁检查：stop() 写入中性命令之后不再下发任何周期
                if !self.started.load(Ordering::Acquire) {
                    break;
                }
                if let Err(e) = self.tick() {
                    warn!("Drive command failed: {}", e);
                    self.metrics.actuator_errors.fetch_add(1, Ordering::Relaxed);
                }
            }

            next += period;
            let now = Instant::now();
            if next > now {
                spin_sleep::sleep(next - now);
            } else {
                next = now;
            }
        }
    }

    /// 停止所有后台循环（与启动顺序相反），并下发中性底盘命令
    ///
    /// 总是成功，可重复调用。
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(release) = &self.release {
            release.stop();
        }
        self.lift.stop();
        self.scale.stop();
        self.orientation.stop();

        // 等待 run() 的当前周期结束
        let _cycle = self.cycle.lock();
        if let Err(e) = self.drive.drive(DriveCommand::NEUTRAL) {
            error!("Failed to neutralize drive: {}", e);
        }

        info!(metrics = ?self.metrics.snapshot(), "Teleop session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// 当前朝向
    pub fn orientation(&self) -> bool {
        self.orientation.get()
    }

    /// 当前速度缩放
    pub fn scale(&self) -> f64 {
        self.scale.get()
    }

    /// 当前控制权归属（`Standard` 模式下始终是主手柄）
    pub fn authority(&self) -> Authority {
        self.arbiter
            .as_ref()
            .map_or(Authority::Primary, |a| a.authority())
    }

    pub fn metrics(&self) -> &Arc<SessionMetrics> {
        &self.metrics
    }

    pub fn arbiter(&self) -> Option<&Arc<OverrideArbiter>> {
        self.arbiter.as_ref()
    }

    pub fn mode(&self) -> TeleopMode {
        self.config.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Drop for TeleopSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TeleopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeleopSession")
            .field("mode", &self.config.mode)
            .field("running", &self.is_running())
            .field("orientation", &self.orientation)
            .field("scale", &self.scale)
            .field("lift", &self.lift)
            .field("arbiter", &self.arbiter)
            .finish()
    }
}
