//! auto 命令
//!
//! 按顺序执行动作计划。执行器是模拟设备，命令只写入日志。

use anyhow::{Context, Result};
use clap::Args;
use mecanum_driver::{ActionCommand, ActionPlan, ActionSequencer};
use std::path::PathBuf;
use tracing::info;

use crate::sim::SimRig;

/// 动作计划执行参数
#[derive(Args, Debug)]
pub struct AutoCommand {
    /// 动作计划文件（TOML 或 JSON）
    pub plan: PathBuf,

    /// 只打印时间表，不执行
    #[arg(long)]
    pub dry_run: bool,
}

impl AutoCommand {
    pub fn execute(&self) -> Result<()> {
        let plan = ActionPlan::load_from_file(&self.plan)
            .with_context(|| format!("failed to load action plan {}", self.plan.display()))?;

        let rig = SimRig::new();
        let sequencer = ActionSequencer::from_plan(rig.drive.clone(), rig.lift.clone(), &plan)
            .context("action plan rejected")?;

        println!("📋 Plan: {} ({} actions)", self.plan.display(), sequencer.len());
        let mut at = 0.0;
        for (index, action) in sequencer.actions().enumerate() {
            println!(
                "  #{:<3} t={:>6.2}s  {}  for {:.2}s",
                index,
                at,
                describe(&action.command),
                action.duration
            );
            at += action.duration;
        }

        if self.dry_run {
            println!("🔍 Dry run: nothing executed");
            return Ok(());
        }

        info!("Executing action plan");
        let report = sequencer.run_all().context("action plan aborted")?;

        println!();
        println!("📊 Result:");
        println!("  actions: {}", report.actions_run);
        println!("  elapsed: {:.2} s", report.elapsed.as_secs_f64());
        println!("  drive commands: {}", rig.drive.count());
        println!("  lift commands: {}", rig.lift.count());

        Ok(())
    }
}

fn describe(command: &ActionCommand) -> String {
    match *command {
        ActionCommand::Drive { x, y, rotation } => {
            format!("drive x={:+.2} y={:+.2} rot={:+.2}", x, y, rotation)
        },
        ActionCommand::Lift { speed } => format!("lift  speed={:+.2}", speed),
    }
}
