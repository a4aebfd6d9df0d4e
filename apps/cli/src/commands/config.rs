//! 配置管理命令

use anyhow::{Context, Result};
use clap::Subcommand;
use mecanum_driver::{SessionConfig, TeleopMode};
use std::fs;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印默认会话配置（TOML）
    Show {
        /// 控制模式
        #[arg(short, long)]
        mode: Option<TeleopMode>,
    },

    /// 把默认会话配置写入文件
    Init {
        /// 目标文件
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { mode } => Self::show(mode),
            ConfigCommand::Init { path, force } => Self::init(path, force),
        }
    }

    fn show(mode: Option<TeleopMode>) -> Result<()> {
        let mut config = SessionConfig::default();
        if let Some(mode) = mode {
            config.mode = mode;
        }
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn init(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }

        let content = SessionConfig::default().to_toml_string()?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        println!("✅ Wrote default config to {}", path.display());
        Ok(())
    }
}
