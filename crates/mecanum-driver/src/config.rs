//! 会话配置
//!
//! 所有可调参数（周期、死区、缩放、按钮绑定、升降绑定、控制模式）集中在
//! `SessionConfig` 中，在会话构造时显式传入。缺省字段使用文档化的默认值。
//!
//! ```toml
//! mode = "restricted"
//! period_ms = 10
//!
//! [drive]
//! initial_scale = 0.4
//! scale_step = 0.1
//!
//! [drive.dead_zone]
//! low = -0.18
//! high = 0.18
//!
//! [lift.binding]
//! kind = "triggers"
//! forward_axis = 2
//! backward_axis = 3
//! ```

use crate::buffer::{DeadZone, clamp_scale};
use crate::error::DriverError;
use crate::lift::{LiftBinding, RetractDirection};
use crate::scale::DEFAULT_SCALE_STEP;
use mecanum_hal::layout::*;
use mecanum_hal::{AxisId, ButtonId};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 默认轮询周期（毫秒）
pub const DEFAULT_PERIOD_MS: u64 = 10;

/// 默认初始缩放
pub const DEFAULT_INITIAL_SCALE: f64 = 0.4;

/// 手动控制模式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TeleopMode {
    /// 无接管：朝向、缩放、驾驶都来自主手柄，升降直接由副手柄控制
    Standard = 0,
    /// 受限模式：副手柄可以接管升降，驾驶始终来自主手柄
    Restricted = 1,
    /// 访客模式：副手柄可以接管驾驶、朝向和升降
    Guest = 2,
}

// 不用 `#[default]`：num_enum 会把它当作未知编号的兜底值
#[allow(clippy::derivable_impls)]
impl Default for TeleopMode {
    fn default() -> Self {
        TeleopMode::Restricted
    }
}

impl TeleopMode {
    pub const ALL: [TeleopMode; 3] = [TeleopMode::Standard, TeleopMode::Restricted, TeleopMode::Guest];

    /// 按数字编号解析
    ///
    /// # 错误
    /// - `DriverError::InvalidTeleopMode`: 未知编号
    pub fn from_id(id: u8) -> Result<Self, DriverError> {
        TeleopMode::try_from_primitive(id).map_err(|e| DriverError::InvalidTeleopMode(e.number.to_string()))
    }

    pub fn id(self) -> u8 {
        self.into()
    }

    pub fn name(self) -> &'static str {
        match self {
            TeleopMode::Standard => "standard",
            TeleopMode::Restricted => "restricted",
            TeleopMode::Guest => "guest",
        }
    }

    /// 是否启用接管仲裁
    pub fn uses_arbiter(self) -> bool {
        !matches!(self, TeleopMode::Standard)
    }
}

impl std::fmt::Display for TeleopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TeleopMode {
    type Err = DriverError;

    /// 接受名称（不区分大小写）或数字编号
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id);
        }
        TeleopMode::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DriverError::InvalidTeleopMode(s.to_string()))
    }
}

/// 底盘驾驶配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub dead_zone: DeadZone,
    /// 初始缩放，按 `|scale|` 取值并限制到 1
    pub initial_scale: f64,
    pub scale_step: f64,
    /// 初始朝向
    pub initially_inverted: bool,
    /// 旋转轴是否反向（与朝向无关）
    pub invert_rotation: bool,
    pub x_axis: AxisId,
    pub y_axis: AxisId,
    pub rotation_axis: AxisId,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            dead_zone: DeadZone::default(),
            initial_scale: DEFAULT_INITIAL_SCALE,
            scale_step: DEFAULT_SCALE_STEP,
            initially_inverted: true,
            invert_rotation: true,
            x_axis: LEFT_X_AXIS,
            y_axis: LEFT_Y_AXIS,
            rotation_axis: RIGHT_X_AXIS,
        }
    }
}

/// 按钮绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub orientation: ButtonId,
    pub scale_up: ButtonId,
    pub scale_down: ButtonId,
    /// 主手柄上的接管按钮
    pub trap: ButtonId,
    /// 副手柄上的释放按钮
    pub release: ButtonId,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            orientation: A_BUTTON,
            scale_up: RIGHT_BUMPER,
            scale_down: LEFT_BUMPER,
            trap: B_BUTTON,
            release: Y_BUTTON,
        }
    }
}

/// 升降配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub binding: LiftBinding,
    pub retract: RetractDirection,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            binding: LiftBinding::Triggers {
                forward_axis: LEFT_TRIGGER_AXIS,
                backward_axis: RIGHT_TRIGGER_AXIS,
            },
            retract: RetractDirection::default(),
        }
    }
}

/// 手动控制会话配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: TeleopMode,
    /// 所有轮询循环的周期（毫秒）
    pub period_ms: u64,
    pub drive: DriveConfig,
    pub buttons: ButtonConfig,
    pub lift: LiftConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: TeleopMode::default(),
            period_ms: DEFAULT_PERIOD_MS,
            drive: DriveConfig::default(),
            buttons: ButtonConfig::default(),
            lift: LiftConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_mode(mut self, mode: TeleopMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// 归一化后的初始缩放
    pub fn initial_scale(&self) -> f64 {
        clamp_scale(self.drive.initial_scale)
    }

    /// 校验配置
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 第一个不合法的字段
    pub fn validate(&self) -> Result<(), DriverError> {
        let invalid = |msg: String| Err(DriverError::InvalidConfig(msg));

        if self.period_ms == 0 {
            return invalid("period_ms must be greater than 0".to_string());
        }

        let dz = self.drive.dead_zone;
        if !dz.low.is_finite() || !dz.high.is_finite() || dz.low > dz.high {
            return invalid(format!(
                "dead zone must satisfy low <= high, got [{}, {}]",
                dz.low, dz.high
            ));
        }
        if !self.drive.initial_scale.is_finite() {
            return invalid(format!(
                "initial_scale must be finite, got {}",
                self.drive.initial_scale
            ));
        }
        if !self.drive.scale_step.is_finite() || self.drive.scale_step <= 0.0 {
            return invalid(format!(
                "scale_step must be a positive finite number, got {}",
                self.drive.scale_step
            ));
        }

        let b = &self.buttons;
        if b.scale_up == b.scale_down {
            return invalid(format!("scale_up and scale_down share {}", b.scale_up));
        }
        if self.mode.uses_arbiter() && b.trap == b.orientation {
            return invalid(format!("trap and orientation share {}", b.trap));
        }

        match self.lift.binding {
            LiftBinding::Triggers {
                forward_axis,
                backward_axis,
            } if forward_axis == backward_axis => {
                invalid(format!("lift triggers share {}", forward_axis))
            },
            LiftBinding::Buttons { up, down, .. } if up == down => {
                invalid(format!("lift buttons share {}", up))
            },
            LiftBinding::Buttons { speed, .. } if !speed.is_finite() || speed.abs() > 1.0 => {
                invalid(format!("lift speed must be within [-1, 1], got {}", speed))
            },
            _ => Ok(()),
        }
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(s: &str) -> Result<Self, DriverError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载并校验
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string_pretty(self).map_err(|e| DriverError::ConfigParse(e.to_string()))
    }
}
