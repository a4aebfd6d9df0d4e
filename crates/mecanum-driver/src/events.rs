//! 会话事件钩子
//!
//! 把接管/释放、朝向翻转、缩放变化、限位触发等状态跳变发布给外部协作者
//! （例如仪表盘）。基于有界通道：
//!
//! - **非阻塞**：发布端使用 `try_send`，队列满时丢弃事件，不阻塞轮询循环
//! - **丢弃监控**：`dropped_events` 计数器
//!
//! # 使用示例
//!
//! ```rust
//! use mecanum_driver::events::{EventHook, SessionEvent};
//!
//! let (hook, rx) = EventHook::new(64);
//! hook.publish(SessionEvent::Trapped);
//! assert_eq!(rx.try_recv().unwrap(), SessionEvent::Trapped);
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 会话事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// 副手柄接管控制
    Trapped,
    /// 控制权交还主手柄
    Released,
    /// 驾驶朝向翻转（新值）
    OrientationChanged { inverted: bool },
    /// 速度缩放变化（新值）
    ScaleChanged { scale: f64 },
    /// 限位开关把收回命令归零（被丢弃的原始命令）
    LimitEngaged { requested: f64 },
}

/// 事件发布端（可克隆，在各轮询循环之间共享）
#[derive(Debug, Clone)]
pub struct EventHook {
    tx: Sender<SessionEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl EventHook {
    /// 创建新的事件钩子
    ///
    /// # 返回
    ///
    /// - `(hook, rx)`: 发布端和接收端
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = bounded(capacity);
        let hook = Self {
            tx,
            dropped_events: Arc::new(AtomicU64::new(0)),
        };
        (hook, rx)
    }

    /// 发布事件（非阻塞）
    pub fn publish(&self, event: SessionEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            },
            // 接收端已关闭：没有订阅者，静默忽略
            Err(TrySendError::Disconnected(_)) => {},
        }
    }

    /// 丢弃的事件数
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

/// 可选事件钩子的发布辅助
pub(crate) fn publish(hook: &Option<EventHook>, event: SessionEvent) {
    if let Some(hook) = hook {
        hook.publish(event);
    }
}
