//! # Mecanum HAL
//!
//! 设备抽象层，提供控制核心与外部 I/O 胶水代码之间的统一接口。
//!
//! - 输入源：`InputSource`（手柄，轮询读取，从不推送）
//! - 执行器：`DriveSink`（四输入全向底盘）、`LiftSink`（单轴升降）
//! - 传感器：`LimitSwitch`、`AnalogInput`
//! - 附件：`RelaySink`、`SolenoidSink`
//!
//! 所有 trait 方法都使用 `&self`，由实现方负责内部可变性，
//! 这样同一个执行器可以在自动阶段和手动阶段之间共享（`Arc<dyn DriveSink>`）。

use thiserror::Error;

pub mod layout;

#[cfg(feature = "mock")]
pub mod mock;

/// 手柄按钮编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ButtonId(pub u8);

/// 手柄轴编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AxisId(pub u8);

impl std::fmt::Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "button {}", self.0)
    }
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "axis {}", self.0)
    }
}

/// 执行器层统一错误类型
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("Device Error: {0}")]
    Device(#[from] DeviceError),
    #[error("Command out of range: {0}")]
    OutOfRange(f64),
}

/// 设备错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    Unknown,
    NotFound,
    Busy,
    Timeout,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&str> for DeviceError {
    fn from(message: &str) -> Self {
        Self::new(DeviceErrorKind::Unknown, message)
    }
}

/// 全向底盘命令（笛卡尔坐标）
///
/// 四个分量均为 [-1, 1] 内的有符号浮点数。
/// `reserved` 对应底盘驱动的陀螺仪角度输入，手动控制时恒为 0。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveCommand {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reserved: f64,
}

impl DriveCommand {
    /// 中性命令（全零）
    pub const NEUTRAL: Self = Self {
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        reserved: 0.0,
    };

    pub fn new(x: f64, y: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            rotation,
            reserved: 0.0,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.rotation == 0.0 && self.reserved == 0.0
    }

    /// 以数组形式返回四个分量，便于统一做范围校验
    pub fn components(&self) -> [f64; 4] {
        [self.x, self.y, self.rotation, self.reserved]
    }
}

/// 继电器输出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelayValue {
    #[default]
    Off,
    Forward,
    Reverse,
}

/// 输入源（手柄）
///
/// 轴读数范围 [-1, 1]，按钮读数为布尔值。实现方不得阻塞。
pub trait InputSource: Send + Sync {
    fn axis(&self, id: AxisId) -> f64;
    fn button(&self, id: ButtonId) -> bool;
}

/// 全向底盘执行器
pub trait DriveSink: Send + Sync {
    fn drive(&self, command: DriveCommand) -> Result<(), ActuatorError>;
}

/// 升降电机执行器
pub trait LiftSink: Send + Sync {
    fn set_speed(&self, speed: f64) -> Result<(), ActuatorError>;
}

/// 限位开关（轮询）
pub trait LimitSwitch: Send + Sync {
    fn is_triggered(&self) -> bool;
}

/// 模拟量输入（电压）
pub trait AnalogInput: Send + Sync {
    fn voltage(&self) -> f64;
}

/// 继电器执行器
pub trait RelaySink: Send + Sync {
    fn set(&self, value: RelayValue) -> Result<(), ActuatorError>;
}

/// 电磁阀执行器
pub trait SolenoidSink: Send + Sync {
    fn set(&self, on: bool) -> Result<(), ActuatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_command_neutral() {
        assert!(DriveCommand::NEUTRAL.is_neutral());
        assert!(DriveCommand::default().is_neutral());
        assert!(!DriveCommand::new(0.0, 1.0, 0.0).is_neutral());
    }

    #[test]
    fn test_drive_command_components() {
        let cmd = DriveCommand::new(0.1, -0.2, 0.3);
        assert_eq!(cmd.components(), [0.1, -0.2, 0.3, 0.0]);
    }

    #[test]
    fn test_actuator_error_display() {
        let err = ActuatorError::Device(DeviceError::new(DeviceErrorKind::Busy, "talon busy"));
        let msg = format!("{}", err);
        assert!(msg.contains("Busy") && msg.contains("talon busy"), "{}", msg);

        let err = ActuatorError::OutOfRange(1.5);
        assert_eq!(format!("{}", err), "Command out of range: 1.5");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ButtonId(2).to_string(), "button 2");
        assert_eq!(AxisId(4).to_string(), "axis 4");
    }
}
