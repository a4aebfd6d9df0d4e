//! 手柄布局常量（XInput 风格手柄）

use crate::{AxisId, ButtonId};

pub const A_BUTTON: ButtonId = ButtonId(1);
pub const B_BUTTON: ButtonId = ButtonId(2);
pub const X_BUTTON: ButtonId = ButtonId(3);
pub const Y_BUTTON: ButtonId = ButtonId(4);
pub const LEFT_BUMPER: ButtonId = ButtonId(5);
pub const RIGHT_BUMPER: ButtonId = ButtonId(6);
pub const BACK_BUTTON: ButtonId = ButtonId(7);
pub const START_BUTTON: ButtonId = ButtonId(8);
pub const LEFT_JOYSTICK_CLICK: ButtonId = ButtonId(9);
pub const RIGHT_JOYSTICK_CLICK: ButtonId = ButtonId(10);

pub const LEFT_X_AXIS: AxisId = AxisId(0);
pub const LEFT_Y_AXIS: AxisId = AxisId(1);
pub const LEFT_TRIGGER_AXIS: AxisId = AxisId(2);
pub const RIGHT_TRIGGER_AXIS: AxisId = AxisId(3);
pub const RIGHT_X_AXIS: AxisId = AxisId(4);
pub const RIGHT_Y_AXIS: AxisId = AxisId(5);
pub const D_PAD: AxisId = AxisId(6);
