//! 按键去抖翻转器
//!
//! 边沿触发的布尔状态翻转器：按钮每经历一次“按下-松开”周期，状态只翻转一次，
//! 按住不放期间不会重复触发。
//!
//! 不包含任何计时逻辑，由持有者以固定周期（标称 10ms）采样。

/// 去抖翻转器
///
/// # 示例
///
/// ```rust
/// use mecanum_driver::DebouncedToggle;
///
/// let mut toggle = DebouncedToggle::new(false);
/// assert!(toggle.poll(true)); // 按下：翻转
/// assert!(toggle.poll(true)); // 按住：不变
/// assert!(toggle.poll(false)); // 松开：重新上膛
/// assert!(!toggle.poll(true)); // 再次按下：翻转
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncedToggle {
    state: bool,
    armed: bool,
}

impl DebouncedToggle {
    pub fn new(initial: bool) -> Self {
        Self {
            state: initial,
            armed: true,
        }
    }

    /// 处理一个采样，返回处理后的状态
    pub fn poll(&mut self, pressed: bool) -> bool {
        self.poll_edge(pressed);
        self.state
    }

    /// 处理一个采样，返回本次采样是否触发了翻转
    pub fn poll_edge(&mut self, pressed: bool) -> bool {
        if !pressed {
            self.armed = true;
            return false;
        }

        if self.armed {
            self.armed = false;
            self.state = !self.state;
            return true;
        }

        false
    }

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Default for DebouncedToggle {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_held_button_flips_once() {
        let mut toggle = DebouncedToggle::new(false);
        assert!(toggle.poll(true));
        for _ in 0..50 {
            assert!(toggle.poll(true));
        }
        assert!(!toggle.is_armed());
    }

    #[test]
    fn test_release_rearms() {
        let mut toggle = DebouncedToggle::new(true);
        assert!(toggle.poll_edge(true));
        assert!(!toggle.state());
        assert!(!toggle.poll_edge(false));
        assert!(toggle.is_armed());
        assert!(toggle.poll_edge(true));
        assert!(toggle.state());
    }

    #[test]
    fn test_idle_never_flips() {
        let mut toggle = DebouncedToggle::default();
        for _ in 0..10 {
            assert!(!toggle.poll(false));
        }
    }

    /// 统计采样序列中“连续 true”的最大段数
    fn count_press_runs(samples: &[bool]) -> usize {
        let mut runs = 0;
        let mut prev = false;
        for &s in samples {
            if s && !prev {
                runs += 1;
            }
            prev = s;
        }
        runs
    }

    proptest! {
        /// 状态变化次数严格等于按下段数
        #[test]
        fn flips_once_per_press_run(samples in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut toggle = DebouncedToggle::new(false);
            let mut prev_state = toggle.state();
            let mut changes = 0;
            for &s in &samples {
                let state = toggle.poll(s);
                if state != prev_state {
                    changes += 1;
                }
                prev_state = state;
            }
            prop_assert_eq!(changes, count_press_runs(&samples));
        }
    }
}
