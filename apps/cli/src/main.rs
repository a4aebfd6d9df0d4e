//! # Mecanum CLI
//!
//! 全向底盘机器人的手动控制工具。
//!
//! ```bash
//! # 校验会话配置和动作计划
//! mecanum-cli check --config session.toml --plan auto.toml
//!
//! # 打印动作计划的时间表，不执行
//! mecanum-cli auto auto.toml --dry-run
//!
//! # 用模拟设备运行 5 秒手动控制会话（Ctrl-C 提前结束）
//! mecanum-cli teleop --mode guest --seconds 5
//!
//! # 打印默认配置
//! mecanum-cli config show
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod sim;

use commands::{AutoCommand, CheckCommand, ConfigCommand, TeleopCommand};

/// Mecanum CLI - 全向底盘手动控制工具
#[derive(Parser, Debug)]
#[command(name = "mecanum-cli")]
#[command(about = "Teleop configs, action plans and simulated sessions for mecanum robots", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 校验配置文件和动作计划
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 执行动作计划（模拟执行器）
    Auto {
        #[command(flatten)]
        args: AutoCommand,
    },

    /// 运行模拟手动控制会话
    Teleop {
        #[command(flatten)]
        args: TeleopCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mecanum_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { args } => args.execute(),
        Commands::Auto { args } => args.execute(),
        Commands::Teleop { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}
