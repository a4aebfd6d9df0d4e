//! teleop 命令
//!
//! 用模拟设备（空闲手柄、打印执行器）运行一个完整的手动控制会话，
//! 直到超时或 Ctrl-C。

use anyhow::{Context, Result};
use clap::Args;
use mecanum_driver::{EventHook, SessionConfig, TeleopMode, TeleopSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::sim::SimRig;

/// 手动控制会话参数
#[derive(Args, Debug)]
pub struct TeleopCommand {
    /// 会话配置文件（TOML）；缺省使用默认配置
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 控制模式（standard / restricted / guest 或 0-2），覆盖配置文件
    #[arg(short, long)]
    pub mode: Option<TeleopMode>,

    /// 运行时长（秒）；缺省运行到 Ctrl-C
    #[arg(short, long)]
    pub seconds: Option<f64>,
}

impl TeleopCommand {
    pub fn execute(&self) -> Result<()> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load_from_file(path)
                .with_context(|| format!("invalid session config {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode;
        }

        let duration = match self.seconds {
            Some(s) => Some(
                Duration::try_from_secs_f64(s)
                    .with_context(|| format!("invalid --seconds value {}", s))?,
            ),
            None => None,
        };

        let running = Arc::new(AtomicBool::new(true));
        {
            let running = running.clone();
            ctrlc::set_handler(move || {
                running.store(false, Ordering::Release);
            })
            .context("failed to install Ctrl-C handler")?;
        }

        if let Some(duration) = duration {
            let running = running.clone();
            thread::Builder::new()
                .name("teleop-timer".to_string())
                .spawn(move || {
                    thread::sleep(duration);
                    running.store(false, Ordering::Release);
                })
                .context("failed to spawn timer thread")?;
        }

        let rig = SimRig::new();
        let (hook, events) = EventHook::new(256);
        let session = TeleopSession::with_event_hook(config, rig.devices(), hook.clone())
            .context("failed to build teleop session")?;

        println!("🎮 Teleop session: mode={}, period={} ms", config.mode, config.period_ms);
        session.start().context("failed to start teleop session")?;
        session.run(&running);
        session.stop();

        let metrics = session.metrics().snapshot();
        let received = events.try_iter().count();
        info!(events = received, dropped = hook.dropped_events(), "Session events");

        println!();
        println!("📊 Session summary:");
        println!("  control cycles: {}", metrics.control_cycles);
        println!("  lift cycles: {}", metrics.lift_cycles);
        println!("  traps / releases: {} / {}", metrics.traps, metrics.releases);
        println!("  actuator errors: {}", metrics.actuator_errors);
        println!("  final orientation inverted: {}", session.orientation());
        println!("  final scale: {:.2}", session.scale());

        Ok(())
    }
}
