//! # Mecanum Driver
//!
//! 全向底盘机器人的手动控制核心：
//!
//! - 多个独立轮询循环（朝向采样、缩放采样、升降控制、接管释放监视）
//! - 循环之间只通过小的共享单元（`AtomicBool` / `AtomicF64`）通信
//! - 主控制循环每个周期读取一次一致快照，缓冲摇杆输入后驱动底盘
//! - 副手柄可以随时接管（trap），由独立的释放监视器交还控制权
//! - 自动阶段按顺序执行外部提供的定时动作列表
//!
//! # 使用场景
//!
//! 外部胶水代码实现 `mecanum_hal` 中的设备 trait，然后：
//!
//! ```rust,no_run
//! use mecanum_driver::{Devices, SessionConfig, TeleopSession};
//! use std::sync::atomic::AtomicBool;
//!
//! fn teleop(devices: Devices, enabled: &AtomicBool) -> Result<(), mecanum_driver::DriverError> {
//!     let session = TeleopSession::new(SessionConfig::default(), devices)?;
//!     session.start()?;
//!     session.run(enabled);
//!     session.stop();
//!     Ok(())
//! }
//! ```

pub mod arbiter;
pub mod buffer;
pub mod cell;
pub mod config;
mod error;
pub mod events;
pub mod lift;
pub mod metrics;
pub mod orientation;
pub mod relay;
pub mod release;
pub mod scale;
pub mod sequencer;
pub mod session;
pub mod toggle;
pub mod worker;

pub use arbiter::{Authority, OverrideArbiter};
pub use buffer::{DeadZone, buffer, buffer_unscaled, clamp_scale};
pub use config::{ButtonConfig, DriveConfig, LiftConfig, SessionConfig, TeleopMode};
pub use error::DriverError;
pub use events::{EventHook, SessionEvent};
pub use lift::{LiftBinding, LiftController, LiftSource, RetractDirection};
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use orientation::OrientationState;
pub use relay::{InputKind, RelayControl, RelayInput, SolenoidToggle, SwitchRelay, WinchControl};
pub use release::ReleaseMonitor;
pub use scale::ScaleState;
pub use sequencer::{Action, ActionCommand, ActionPlan, ActionSequencer, SequenceReport};
pub use session::{Devices, DriveSnapshot, TeleopSession};
pub use toggle::DebouncedToggle;
pub use worker::{PollWorker, StopOutcome};
