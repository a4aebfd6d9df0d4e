//! Mock 设备（无硬件依赖）
//!
//! 供单元测试和集成测试使用：
//! - `ScriptedInput`：可由测试线程随时修改的手柄读数
//! - `RecordingDriveSink` / `RecordingLiftSink`：把收到的命令按时间顺序写入共享的 `CommandLog`
//! - `MockLimitSwitch` / `MockAnalogInput`：可设置的传感器
//!
//! 所有执行器都支持故障注入（`set_failing(true)`），模拟设备返回错误。

use crate::{
    ActuatorError, AnalogInput, AxisId, ButtonId, DeviceError, DeviceErrorKind, DriveCommand,
    DriveSink, InputSource, LiftSink, LimitSwitch, RelaySink, RelayValue, SolenoidSink,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const MAX_IDS: usize = 16;

/// 超出范围的编号直接 panic，避免绑定错误的测试读到别的按钮/轴
fn slot(kind: &str, id: u8) -> usize {
    let index = id as usize;
    assert!(index < MAX_IDS, "ScriptedInput supports {} ids 0..{}, got {}", kind, MAX_IDS, id);
    index
}

/// 可脚本化的手柄输入
#[derive(Debug, Default)]
pub struct ScriptedInput {
    axes: Mutex<[f64; MAX_IDS]>,
    buttons: Mutex<[bool; MAX_IDS]>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set_axis(&self, id: AxisId, value: f64) {
        self.axes.lock()[slot("axis", id.0)] = value;
    }

    pub fn set_button(&self, id: ButtonId, pressed: bool) {
        self.buttons.lock()[slot("button", id.0)] = pressed;
    }

    /// 松开所有按钮并把所有轴归零
    pub fn reset(&self) {
        *self.axes.lock() = [0.0; MAX_IDS];
        *self.buttons.lock() = [false; MAX_IDS];
    }
}

impl InputSource for ScriptedInput {
    fn axis(&self, id: AxisId) -> f64 {
        self.axes.lock()[slot("axis", id.0)]
    }

    fn button(&self, id: ButtonId) -> bool {
        self.buttons.lock()[slot("button", id.0)]
    }
}

/// 录制到的单条命令
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Drive(DriveCommand),
    Lift(f64),
    Relay(RelayValue),
    Solenoid { channel: u8, on: bool },
}

/// 带时间戳的命令
#[derive(Debug, Clone)]
pub struct LoggedCommand {
    pub at: Instant,
    pub command: Recorded,
}

/// 多个执行器共享的命令日志（保证全局顺序）
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<LoggedCommand>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: Recorded) {
        self.entries.lock().push(LoggedCommand {
            at: Instant::now(),
            command,
        });
    }

    /// 日志快照
    pub fn entries(&self) -> Vec<LoggedCommand> {
        self.entries.lock().clone()
    }

    /// 仅命令（不含时间戳）
    pub fn commands(&self) -> Vec<Recorded> {
        self.entries.lock().iter().map(|e| e.command.clone()).collect()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.entries.lock().last().map(|e| e.command.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn injected_fault() -> ActuatorError {
    ActuatorError::Device(DeviceError::new(
        DeviceErrorKind::Backend,
        "injected fault",
    ))
}

/// 录制底盘命令
#[derive(Debug, Default)]
pub struct RecordingDriveSink {
    log: CommandLog,
    failing: AtomicBool,
}

impl RecordingDriveSink {
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    /// 最近一次底盘命令
    pub fn last_command(&self) -> Option<DriveCommand> {
        self.log.commands().into_iter().rev().find_map(|c| match c {
            Recorded::Drive(cmd) => Some(cmd),
            _ => None,
        })
    }
}

impl DriveSink for RecordingDriveSink {
    fn drive(&self, command: DriveCommand) -> Result<(), ActuatorError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(injected_fault());
        }
        self.log.push(Recorded::Drive(command));
        Ok(())
    }
}

/// 录制升降命令
#[derive(Debug, Default)]
pub struct RecordingLiftSink {
    log: CommandLog,
    failing: AtomicBool,
}

impl RecordingLiftSink {
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    /// 最近一次升降命令
    pub fn last_speed(&self) -> Option<f64> {
        self.log.commands().into_iter().rev().find_map(|c| match c {
            Recorded::Lift(speed) => Some(speed),
            _ => None,
        })
    }

    /// 全部升降命令（按顺序）
    pub fn speeds(&self) -> Vec<f64> {
        self.log
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Lift(speed) => Some(speed),
                _ => None,
            })
            .collect()
    }
}

impl LiftSink for RecordingLiftSink {
    fn set_speed(&self, speed: f64) -> Result<(), ActuatorError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(injected_fault());
        }
        self.log.push(Recorded::Lift(speed));
        Ok(())
    }
}

/// 录制继电器命令
#[derive(Debug, Default)]
pub struct RecordingRelay {
    log: CommandLog,
}

impl RecordingRelay {
    pub fn new(log: CommandLog) -> Self {
        Self { log }
    }

    pub fn last_value(&self) -> Option<RelayValue> {
        self.log.commands().into_iter().rev().find_map(|c| match c {
            Recorded::Relay(value) => Some(value),
            _ => None,
        })
    }
}

impl RelaySink for RecordingRelay {
    fn set(&self, value: RelayValue) -> Result<(), ActuatorError> {
        self.log.push(Recorded::Relay(value));
        Ok(())
    }
}

/// 录制电磁阀命令
#[derive(Debug, Default)]
pub struct RecordingSolenoid {
    channel: u8,
    log: CommandLog,
    state: AtomicBool,
}

impl RecordingSolenoid {
    pub fn new(channel: u8, log: CommandLog) -> Self {
        Self {
            channel,
            log,
            state: AtomicBool::new(false),
        }
    }

    pub fn is_on(&self) -> bool {
        self.state.load(Ordering::Relaxed)
    }
}

impl SolenoidSink for RecordingSolenoid {
    fn set(&self, on: bool) -> Result<(), ActuatorError> {
        self.state.store(on, Ordering::Relaxed);
        self.log.push(Recorded::Solenoid {
            channel: self.channel,
            on,
        });
        Ok(())
    }
}

/// 可设置的限位开关
#[derive(Debug, Default)]
pub struct MockLimitSwitch {
    triggered: AtomicBool,
}

impl MockLimitSwitch {
    pub fn new(triggered: bool) -> Self {
        Self {
            triggered: AtomicBool::new(triggered),
        }
    }

    pub fn set_triggered(&self, triggered: bool) {
        self.triggered.store(triggered, Ordering::Relaxed);
    }
}

impl LimitSwitch for MockLimitSwitch {
    fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Relaxed)
    }
}

/// 可设置的模拟量输入
#[derive(Debug, Default)]
pub struct MockAnalogInput {
    voltage: Mutex<f64>,
}

impl MockAnalogInput {
    pub fn new(voltage: f64) -> Self {
        Self {
            voltage: Mutex::new(voltage),
        }
    }

    pub fn set_voltage(&self, voltage: f64) {
        *self.voltage.lock() = voltage;
    }
}

impl AnalogInput for MockAnalogInput {
    fn voltage(&self) -> f64 {
        *self.voltage.lock()
    }
}
