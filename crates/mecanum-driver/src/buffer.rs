//! 摇杆轴缓冲（死区抑制 + 反向 + 缩放）
//!
//! 纯函数，无状态、无副作用。控制循环和升降循环共用。

use serde::{Deserialize, Serialize};

/// 死区边界（闭区间，允许不对称）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadZone {
    pub low: f64,
    pub high: f64,
}

impl DeadZone {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `raw` 是否落在死区内（含边界）
    pub fn contains(&self, raw: f64) -> bool {
        raw >= self.low && raw <= self.high
    }
}

impl Default for DeadZone {
    fn default() -> Self {
        Self::new(-0.18, 0.18)
    }
}

/// 缩放系数归一化：取绝对值并限制到 [0, 1]；NaN 和无穷大归零
pub fn clamp_scale(scale: f64) -> f64 {
    if !scale.is_finite() {
        return 0.0;
    }
    scale.abs().min(1.0)
}

/// 缓冲一个轴读数
///
/// - `raw` 落在 `[dead_low, dead_high]` 内：输出 0（抑制摇杆漂移）
/// - 否则：`(inverted ? -raw : raw) * clamp(|scale|, 0, 1)`
///
/// 缩放在反向之后施加；输出符号与 `scale` 的符号无关。
///
/// # 示例
///
/// ```rust
/// use mecanum_driver::buffer;
///
/// assert_eq!(buffer(0.05, false, -0.18, 0.18, 1.0), 0.0);
/// assert_eq!(buffer(0.5, false, -0.18, 0.18, 0.5), 0.25);
/// assert_eq!(buffer(0.5, true, -0.18, 0.18, 0.5), -0.25);
/// ```
pub fn buffer(raw: f64, inverted: bool, dead_low: f64, dead_high: f64, scale: f64) -> f64 {
    buffer_unscaled(raw, inverted, DeadZone::new(dead_low, dead_high)) * clamp_scale(scale)
}

/// 不带缩放的缓冲
pub fn buffer_unscaled(raw: f64, inverted: bool, dead_zone: DeadZone) -> f64 {
    if dead_zone.contains(raw) {
        return 0.0;
    }

    if inverted { -raw } else { raw }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dead_zone_suppression() {
        assert_eq!(buffer(0.05, false, -0.18, 0.18, 1.0), 0.0);
        assert_eq!(buffer(-0.18, false, -0.18, 0.18, 1.0), 0.0);
        assert_eq!(buffer(0.18, true, -0.18, 0.18, 1.0), 0.0);
    }

    #[test]
    fn test_scale_and_inversion() {
        assert_eq!(buffer(0.5, false, -0.18, 0.18, 0.5), 0.25);
        assert_eq!(buffer(0.5, true, -0.18, 0.18, 0.5), -0.25);
        assert_eq!(buffer(-1.0, true, -0.18, 0.18, 1.0), 1.0);
    }

    #[test]
    fn test_asymmetric_dead_zone() {
        // 下界更宽：-0.3 落在死区内，而 0.3 不在
        assert_eq!(buffer(-0.3, false, -0.4, 0.1, 1.0), 0.0);
        assert_eq!(buffer(0.3, false, -0.4, 0.1, 1.0), 0.3);
    }

    #[test]
    fn test_negative_scale_does_not_flip_sign() {
        assert_eq!(buffer(0.5, false, -0.18, 0.18, -0.5), 0.25);
        assert_eq!(buffer(0.5, false, -0.18, 0.18, -3.0), 0.5);
    }

    #[test]
    fn test_unscaled() {
        let dz = DeadZone::default();
        assert_eq!(buffer_unscaled(0.1, true, dz), 0.0);
        assert_eq!(buffer_unscaled(0.9, true, dz), -0.9);
    }

    #[test]
    fn test_clamp_scale() {
        assert_eq!(clamp_scale(0.4), 0.4);
        assert_eq!(clamp_scale(-0.4), 0.4);
        assert_eq!(clamp_scale(7.0), 1.0);
        assert_eq!(clamp_scale(0.0), 0.0);
    }

    #[test]
    fn test_non_finite_scale_stops_output() {
        assert_eq!(clamp_scale(f64::NAN), 0.0);
        assert_eq!(clamp_scale(f64::INFINITY), 0.0);
        assert_eq!(clamp_scale(f64::NEG_INFINITY), 0.0);
        assert_eq!(buffer(1.0, false, -0.18, 0.18, f64::NAN), 0.0);
    }

    proptest! {
        /// |scale| > 1 时与 scale = 1 的幅值一致
        #[test]
        fn large_scale_behaves_like_unit(
            raw in -1.0..1.0f64,
            inverted in any::<bool>(),
            scale in prop_oneof![1.0..100.0f64, -100.0..-1.0f64],
        ) {
            let a = buffer(raw, inverted, -0.18, 0.18, scale);
            let b = buffer(raw, inverted, -0.18, 0.18, 1.0);
            prop_assert_eq!(a, b);
        }

        /// 输出符号只由 raw 与 inverted 决定
        #[test]
        fn sign_independent_of_scale(
            raw in -1.0..1.0f64,
            inverted in any::<bool>(),
            scale in -1.0..1.0f64,
        ) {
            let pos = buffer(raw, inverted, -0.18, 0.18, scale.abs());
            let neg = buffer(raw, inverted, -0.18, 0.18, -scale.abs());
            prop_assert_eq!(pos, neg);
        }
    }
}
