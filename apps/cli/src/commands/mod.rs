//! 命令定义和实现

pub mod auto;
pub mod check;
pub mod config;
pub mod teleop;

pub use auto::AutoCommand;
pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use teleop::TeleopCommand;
