//! 无硬件的模拟设备
//!
//! - `IdleInput`：所有轴为 0、所有按钮松开的手柄
//! - `LoggingDriveSink` / `LoggingLiftSink`：把收到的命令写入日志；超出 [-1, 1] 的命令被拒绝
//! - `OpenSwitch`：永远未触发的限位开关

use mecanum_driver::Devices;
use mecanum_hal::{
    ActuatorError, AxisId, ButtonId, DriveCommand, DriveSink, InputSource, LiftSink, LimitSwitch,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// 空闲手柄
#[derive(Debug, Default)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn axis(&self, _id: AxisId) -> f64 {
        0.0
    }

    fn button(&self, _id: ButtonId) -> bool {
        false
    }
}

/// 打印底盘命令
///
/// 手动控制循环每 10ms 下发一次命令，所以只在命令变化时用 `info!` 输出，
/// 其他命令走 `debug!`。
#[derive(Debug, Default)]
pub struct LoggingDriveSink {
    last: Last<DriveCommand>,
    count: AtomicU64,
}

impl LoggingDriveSink {
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl DriveSink for LoggingDriveSink {
    fn drive(&self, command: DriveCommand) -> Result<(), ActuatorError> {
        for value in command.components() {
            check_range(value)?;
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.last.replace(command) {
            info!(
                x = command.x,
                y = command.y,
                rotation = command.rotation,
                "drive"
            );
        } else {
            debug!(?command, "drive");
        }
        Ok(())
    }
}

/// 打印升降命令
#[derive(Debug, Default)]
pub struct LoggingLiftSink {
    last: Last<f64>,
    count: AtomicU64,
}

impl LoggingLiftSink {
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl LiftSink for LoggingLiftSink {
    fn set_speed(&self, speed: f64) -> Result<(), ActuatorError> {
        check_range(speed)?;
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.last.replace(speed) {
            info!(speed, "lift");
        } else {
            debug!(speed, "lift");
        }
        Ok(())
    }
}

fn check_range(value: f64) -> Result<(), ActuatorError> {
    if value.is_finite() && value.abs() <= 1.0 {
        Ok(())
    } else {
        Err(ActuatorError::OutOfRange(value))
    }
}

/// 永远未触发的限位开关
#[derive(Debug, Default)]
pub struct OpenSwitch;

impl LimitSwitch for OpenSwitch {
    fn is_triggered(&self) -> bool {
        false
    }
}

/// 一组模拟设备
pub struct SimRig {
    pub drive: Arc<LoggingDriveSink>,
    pub lift: Arc<LoggingLiftSink>,
}

impl SimRig {
    pub fn new() -> Self {
        Self {
            drive: Arc::new(LoggingDriveSink::default()),
            lift: Arc::new(LoggingLiftSink::default()),
        }
    }

    pub fn devices(&self) -> Devices {
        Devices {
            primary: Arc::new(IdleInput),
            secondary: Arc::new(IdleInput),
            drive: self.drive.clone(),
            lift: self.lift.clone(),
            lift_limit: Arc::new(OpenSwitch),
        }
    }
}

/// 最近一个值；`replace` 返回新值是否与上一个不同
#[derive(Debug, Default)]
struct Last<T>(Mutex<Option<T>>);

impl<T: PartialEq + Copy> Last<T> {
    fn replace(&self, value: T) -> bool {
        let mut guard = self.0.lock();
        let changed = *guard != Some(value);
        *guard = Some(value);
        changed
    }
}
