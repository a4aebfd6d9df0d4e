//! check 命令
//!
//! 加载并校验会话配置和动作计划，不驱动任何设备

use anyhow::{Context, Result, bail};
use clap::Args;
use mecanum_driver::{ActionPlan, SessionConfig};
use std::path::PathBuf;

/// 校验命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 会话配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 动作计划文件（TOML 或 JSON）
    #[arg(short, long)]
    pub plan: Option<PathBuf>,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<()> {
        if self.config.is_none() && self.plan.is_none() {
            bail!("nothing to check: pass --config and/or --plan");
        }

        if let Some(path) = &self.config {
            let config = SessionConfig::load_from_file(path)
                .with_context(|| format!("invalid session config {}", path.display()))?;
            println!("✅ Config OK: {}", path.display());
            println!("    mode: {}", config.mode);
            println!("    period: {} ms", config.period_ms);
            println!("    initial scale: {:.2}", config.initial_scale());
        }

        if let Some(path) = &self.plan {
            let plan = ActionPlan::load_from_file(path)
                .with_context(|| format!("failed to load action plan {}", path.display()))?;
            plan.validate()
                .with_context(|| format!("invalid action plan {}", path.display()))?;
            println!("✅ Plan OK: {}", path.display());
            println!("    {} actions, {:.2} s total", plan.actions.len(), plan.total_duration());
        }

        Ok(())
    }
}
