//! 继电器与电磁阀附件控制
//!
//! 一次性调用的附件逻辑，不带轮询线程，由外部循环按需调用：
//!
//! - `RelayControl`：两个输入（按钮或轴的半程）决定继电器方向，可选内外限位开关
//! - `SwitchRelay`：两个数字开关直接决定继电器方向
//! - `WinchControl`：超声波测距，未到达拉回目标时正转
//! - `SolenoidToggle`：开/关两个按钮切换一对互补的电磁阀

use crate::error::DriverError;
use mecanum_hal::{
    ActuatorError, AnalogInput, AxisId, ButtonId, InputSource, LimitSwitch, RelaySink, RelayValue,
    SolenoidSink,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// 轴输入视为按下的阈值（正向 <= -0.40，反向 >= 0.40）
pub const AXIS_PRESS_THRESHOLD: f64 = 0.40;

/// 超声波传感器每单位距离对应的电压
pub const SONAR_VOLTS_PER_UNIT: f64 = 0.0048828125;

/// 附件输入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Button,
    Axis,
}

impl FromStr for InputKind {
    type Err = DriverError;

    /// 不区分大小写；其他字符串立即拒绝
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("button") {
            Ok(InputKind::Button)
        } else if s.eq_ignore_ascii_case("axis") {
            Ok(InputKind::Axis)
        } else {
            Err(DriverError::InvalidInputKind(s.to_string()))
        }
    }
}

/// 继电器的两个方向输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayInput {
    Buttons { forward: ButtonId, back: ButtonId },
    /// 轴的两个半程；通常 forward 与 back 是同一个轴
    Axis { forward: AxisId, back: AxisId },
}

impl RelayInput {
    pub fn new(kind: InputKind, forward: u8, back: u8) -> Self {
        match kind {
            InputKind::Button => RelayInput::Buttons {
                forward: ButtonId(forward),
                back: ButtonId(back),
            },
            InputKind::Axis => RelayInput::Axis {
                forward: AxisId(forward),
                back: AxisId(back),
            },
        }
    }

    /// 从类型字符串构造
    ///
    /// # 错误
    /// - `DriverError::InvalidInputKind`: 既不是 "button" 也不是 "axis"
    pub fn parse(kind: &str, forward: u8, back: u8) -> Result<Self, DriverError> {
        Ok(Self::new(kind.parse()?, forward, back))
    }

    pub fn kind(&self) -> InputKind {
        match self {
            RelayInput::Buttons { .. } => InputKind::Button,
            RelayInput::Axis { .. } => InputKind::Axis,
        }
    }

    /// 采样两个方向是否按下
    pub fn pressed(&self, source: &dyn InputSource) -> (bool, bool) {
        match *self {
            RelayInput::Buttons { forward, back } => (source.button(forward), source.button(back)),
            RelayInput::Axis { forward, back } => (
                source.axis(forward) <= -AXIS_PRESS_THRESHOLD,
                source.axis(back) >= AXIS_PRESS_THRESHOLD,
            ),
        }
    }
}

/// 两个方向输入决定继电器方向：只有一个方向按下时运行
pub fn relay_direction(forward: bool, back: bool) -> RelayValue {
    match (forward, back) {
        (true, false) => RelayValue::Forward,
        (false, true) => RelayValue::Reverse,
        _ => RelayValue::Off,
    }
}

/// 带限位的继电器方向：朝已触发的限位运动时关闭
pub fn limited_relay_direction(forward: bool, back: bool, inside: bool, outside: bool) -> RelayValue {
    match relay_direction(forward, back) {
        RelayValue::Forward if outside => RelayValue::Off,
        RelayValue::Reverse if inside => RelayValue::Off,
        value => value,
    }
}

/// 绞盘规则：距离未达到拉回目标（容差内视为到达）时正转
pub fn winch_direction(voltage: f64, pull_back: f64, tolerance: f64) -> RelayValue {
    let pulled_back = voltage / SONAR_VOLTS_PER_UNIT;
    if (pulled_back - pull_back).abs() <= tolerance {
        RelayValue::Off
    } else {
        RelayValue::Forward
    }
}

/// 电磁阀对：开按钮优先；都未按下时返回 `None`（保持原状态）
pub fn solenoid_pair(on_pressed: bool, off_pressed: bool) -> Option<(bool, bool)> {
    if on_pressed {
        Some((true, false))
    } else if off_pressed {
        Some((false, true))
    } else {
        None
    }
}

/// 内外限位开关
#[derive(Clone)]
pub struct RelayLimits {
    pub inside: Arc<dyn LimitSwitch>,
    pub outside: Arc<dyn LimitSwitch>,
}

/// 手柄控制的继电器
pub struct RelayControl {
    relay: Arc<dyn RelaySink>,
    input: RelayInput,
    limits: Option<RelayLimits>,
}

impl RelayControl {
    pub fn new(relay: Arc<dyn RelaySink>, input: RelayInput) -> Self {
        Self {
            relay,
            input,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: RelayLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// 采样输入并写入继电器，返回写入的值
    pub fn update(&self, source: &dyn InputSource) -> Result<RelayValue, ActuatorError> {
        let (forward, back) = self.input.pressed(source);
        let value = match &self.limits {
            Some(l) => {
                limited_relay_direction(forward, back, l.inside.is_triggered(), l.outside.is_triggered())
            },
            None => relay_direction(forward, back),
        };
        trace!(?value, "Relay update");
        self.relay.set(value)?;
        Ok(value)
    }
}

/// 两个数字开关控制的继电器
pub struct SwitchRelay {
    relay: Arc<dyn RelaySink>,
    forward: Arc<dyn LimitSwitch>,
    back: Arc<dyn LimitSwitch>,
}

impl SwitchRelay {
    pub fn new(
        relay: Arc<dyn RelaySink>,
        forward: Arc<dyn LimitSwitch>,
        back: Arc<dyn LimitSwitch>,
    ) -> Self {
        Self {
            relay,
            forward,
            back,
        }
    }

    pub fn update(&self) -> Result<RelayValue, ActuatorError> {
        let value = relay_direction(self.forward.is_triggered(), self.back.is_triggered());
        self.relay.set(value)?;
        Ok(value)
    }
}

/// 超声波测距控制的绞盘
pub struct WinchControl {
    relay: Arc<dyn RelaySink>,
    sonar: Arc<dyn AnalogInput>,
    pull_back: f64,
    tolerance: f64,
}

impl WinchControl {
    /// # 错误
    /// - `DriverError::InvalidConfig`: 目标或容差不是有限数，或容差为负
    pub fn new(
        relay: Arc<dyn RelaySink>,
        sonar: Arc<dyn AnalogInput>,
        pull_back: f64,
        tolerance: f64,
    ) -> Result<Self, DriverError> {
        if !pull_back.is_finite() || !tolerance.is_finite() || tolerance < 0.0 {
            return Err(DriverError::InvalidConfig(format!(
                "winch pull_back {} / tolerance {} must be finite with tolerance >= 0",
                pull_back, tolerance
            )));
        }
        Ok(Self {
            relay,
            sonar,
            pull_back,
            tolerance,
        })
    }

    pub fn update(&self) -> Result<RelayValue, ActuatorError> {
        let value = winch_direction(self.sonar.voltage(), self.pull_back, self.tolerance);
        self.relay.set(value)?;
        Ok(value)
    }
}

/// 互补电磁阀对
pub struct SolenoidToggle {
    first: Arc<dyn SolenoidSink>,
    second: Arc<dyn SolenoidSink>,
    on_button: ButtonId,
    off_button: ButtonId,
}

impl SolenoidToggle {
    pub fn new(
        first: Arc<dyn SolenoidSink>,
        second: Arc<dyn SolenoidSink>,
        on_button: ButtonId,
        off_button: ButtonId,
    ) -> Self {
        Self {
            first,
            second,
            on_button,
            off_button,
        }
    }

    /// 采样按钮，必要时切换电磁阀；返回第一个电磁阀的新状态（未切换时为 `None`）
    pub fn update(&self, source: &dyn InputSource) -> Result<Option<bool>, ActuatorError> {
        let pair = solenoid_pair(source.button(self.on_button), source.button(self.off_button));
        match pair {
            Some((first, second)) => {
                self.first.set(first)?;
                self.second.set(second)?;
                Ok(Some(first))
            },
            None => Ok(None),
        }
    }
}
