//! 驾驶朝向状态
//!
//! 持有一个“朝向反转”标志，由绑定在某个按钮上的 `DebouncedToggle` 翻转。
//! 主控制循环每个周期读取一次；采样既可以由主循环同步调用 `poll()`，
//! 也可以用 `start()` 放到独立的轮询线程。

use crate::error::DriverError;
use crate::events::{self, EventHook, SessionEvent};
use crate::toggle::DebouncedToggle;
use crate::worker::{PollWorker, StopOutcome};
use mecanum_hal::{ButtonId, InputSource};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

struct OrientationInner {
    source: Arc<dyn InputSource>,
    button: ButtonId,
    /// 采样状态：只有轮询方（单写者）会锁它
    toggle: Mutex<DebouncedToggle>,
    /// 共享单元
    inverted: AtomicBool,
    events: Option<EventHook>,
}

impl OrientationInner {
    fn poll(&self) -> bool {
        let pressed = self.source.button(self.button);
        let mut toggle = self.toggle.lock();

        if toggle.poll_edge(pressed) {
            let inverted = toggle.state();
            self.inverted.store(inverted, Ordering::Release);
            debug!(inverted, "Drive orientation flipped");
            events::publish(&self.events, SessionEvent::OrientationChanged { inverted });
        }

        toggle.state()
    }
}

/// 驾驶朝向状态
pub struct OrientationState {
    inner: Arc<OrientationInner>,
    worker: PollWorker,
}

impl OrientationState {
    /// 创建朝向状态
    ///
    /// # 参数
    /// - `source`: 采样按钮所在的输入源（可以是 `OverrideArbiter`）
    /// - `button`: 翻转按钮
    /// - `initial_inverted`: 初始朝向
    pub fn new(source: Arc<dyn InputSource>, button: ButtonId, initial_inverted: bool) -> Self {
        Self {
            inner: Arc::new(OrientationInner {
                source,
                button,
                toggle: Mutex::new(DebouncedToggle::new(initial_inverted)),
                inverted: AtomicBool::new(initial_inverted),
                events: None,
            }),
            worker: PollWorker::new("orientation"),
        }
    }

    /// 挂接事件钩子
    ///
    /// 必须在 `start()` 之前调用；轮询线程启动后调用不生效。
    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.events = Some(hook);
        }
        self
    }

    /// 采样一次按钮并更新朝向，返回更新后的值
    pub fn poll(&self) -> bool {
        self.inner.poll()
    }

    /// 最近一次计算出的朝向
    pub fn get(&self) -> bool {
        self.inner.inverted.load(Ordering::Acquire)
    }

    /// 启动后台轮询线程
    pub fn start(&self, period: Duration) -> Result<(), DriverError> {
        let inner = self.inner.clone();
        self.worker.start(
            period,
            move || {
                inner.poll();
            },
            || {},
        )
    }

    /// 停止后台轮询线程（总是成功）
    pub fn stop(&self) -> StopOutcome {
        self.worker.stop()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }
}

impl std::fmt::Debug for OrientationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientationState")
            .field("inverted", &self.get())
            .field("button", &self.inner.button)
            .field("worker", &self.worker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecanum_hal::layout::A_BUTTON;
    use mecanum_hal::mock::ScriptedInput;

    #[test]
    fn test_poll_flips_on_press() {
        let input = ScriptedInput::shared();
        let state = OrientationState::new(input.clone(), A_BUTTON, true);
        assert!(state.get());

        input.set_button(A_BUTTON, true);
        assert!(!state.poll());
        assert!(!state.poll());
        assert!(!state.get());

        input.set_button(A_BUTTON, false);
        state.poll();
        input.set_button(A_BUTTON, true);
        assert!(state.poll());
        assert!(state.get());
    }

    #[test]
    fn test_background_polling() {
        let input = ScriptedInput::shared();
        let (hook, rx) = EventHook::new(8);
        let state = OrientationState::new(input.clone(), A_BUTTON, false).with_event_hook(hook);
        state.start(Duration::from_millis(2)).unwrap();

        input.set_button(A_BUTTON, true);
        std::thread::sleep(Duration::from_millis(30));
        input.set_button(A_BUTTON, false);
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(state.stop(), StopOutcome::Joined);
        assert!(state.get());
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::OrientationChanged { inverted: true }
        );
        // 按住期间不重复翻转
        assert!(rx.try_recv().is_err());
    }
}
