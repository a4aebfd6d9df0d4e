//! 轮询线程管理
//!
//! 每个后台循环（朝向采样、缩放采样、升降控制、接管释放监视）都由一个
//! `PollWorker` 持有：
//!
//! - 运行标志在每次迭代的**开头**检查（协作式取消，不做抢占）
//! - 固定周期节拍，使用绝对时间锚点消除累积漂移
//! - `stop()` 清除运行标志并 join 线程；返回时线程一定已经退出
//! - 退出钩子（`on_exit`）在工作线程上、线程结束之前执行，用于失效安全归零

use crate::error::DriverError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, trace};

/// `stop()` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// 循环未在运行（从未启动或已停止）
    NotRunning,
    /// 循环正常退出并已 join
    Joined,
    /// 工作线程 panic（退出钩子可能未执行）
    Panicked,
}

/// 固定周期轮询线程
pub struct PollWorker {
    name: &'static str,
    /// 运行标志（Release 写 / Acquire 读）
    running: Arc<AtomicBool>,
    /// 线程句柄；`stop()` 持锁 join，保证并发调用者都等到线程退出
    handle: Mutex<Option<JoinHandle<()>>>,
    /// 是否尝试提升线程优先级（需要 `realtime` feature）
    realtime: bool,
}

impl PollWorker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            realtime: false,
        }
    }

    /// 请求实时优先级（仅在启用 `realtime` feature 时生效）
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 循环是否在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 启动循环
    ///
    /// # 参数
    /// - `period`: 迭代周期（标称 10ms）
    /// - `tick`: 每次迭代执行的工作
    /// - `on_exit`: 循环退出后、线程结束前执行
    ///
    /// # 错误
    /// - `DriverError::AlreadyRunning`: 已有线程在运行
    /// - `DriverError::Spawn`: 线程创建失败
    pub fn start<T, E>(&self, period: Duration, mut tick: T, on_exit: E) -> Result<(), DriverError>
    where
        T: FnMut() + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let mut slot = self.handle.lock();
        if slot.is_some() {
            return Err(DriverError::AlreadyRunning(self.name));
        }

        self.running.store(true, Ordering::Release);
        let running = self.running.clone();
        let name = self.name;
        let realtime = self.realtime;

        let spawned = std::thread::Builder::new().name(name.to_string()).spawn(move || {
            if realtime {
                raise_priority(name);
            }

            let mut next = Instant::now();
            loop {
                // Acquire: 看到 false 时，必须能看到 stop 之前的所有写入
                if !running.load(Ordering::Acquire) {
                    trace!("{}: running flag is false, exiting", name);
                    break;
                }

                tick();

                // 绝对时间锚点；任务超时（overrun）时重新对齐到当前时刻
                next += period;
                let now = Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                } else {
                    next = now;
                }
            }

            on_exit();
            trace!("{}: loop exited", name);
        });

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                Ok(())
            },
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(DriverError::Spawn(e))
            },
        }
    }

    /// 停止循环并等待线程退出
    ///
    /// 总是成功返回（不 panic，不返回错误），可重复调用。
    /// 不能在工作线程自身内部调用（会 join 自己）。
    pub fn stop(&self) -> StopOutcome {
        // Release: stop 之前的所有写入对工作线程可见
        self.running.store(false, Ordering::Release);

        let mut slot = self.handle.lock();
        match slot.take() {
            None => StopOutcome::NotRunning,
            Some(handle) => match handle.join() {
                Ok(()) => StopOutcome::Joined,
                Err(_) => {
                    error!("{}: worker thread panicked", self.name);
                    StopOutcome::Panicked
                },
            },
        }
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PollWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(feature = "realtime")]
fn raise_priority(name: &str) {
    use thread_priority::*;
    use tracing::{info, warn};

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(_) => {
            info!("{} thread priority set to MAX (realtime)", name);
        },
        Err(e) => {
            warn!(
                "Failed to set {} thread priority: {:?}. \
                On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                name, e
            );
        },
    }
}

#[cfg(not(feature = "realtime"))]
fn raise_priority(name: &str) {
    trace!("{}: realtime priority requested but feature is disabled", name);
}
