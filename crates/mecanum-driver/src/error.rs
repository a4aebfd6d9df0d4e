//! 驱动层错误类型定义

use mecanum_hal::ActuatorError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 配置无效（构造时立即拒绝，不做静默默认）
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 未知的输入类型字符串
    #[error("{0} is not a valid type of input")]
    InvalidInputKind(String),

    /// 未知的手动控制模式
    #[error("Invalid teleop mode: {0}")]
    InvalidTeleopMode(String),

    /// 动作序列校验失败（第一个动作执行前报告）
    #[error("Invalid action #{index}: {reason}")]
    InvalidAction { index: usize, reason: String },

    /// 执行器错误
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// 动作执行失败（序列中止，不再继续）
    #[error("Action #{index} failed: {source}")]
    ActionFailed {
        index: usize,
        #[source]
        source: ActuatorError,
    },

    /// 后台循环已在运行
    #[error("Polling loop already running: {0}")]
    AlreadyRunning(&'static str),

    /// 线程创建失败
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// 配置文件解析错误
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// 文件读写错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for DriverError {
    fn from(e: toml::de::Error) -> Self {
        DriverError::ConfigParse(e.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(e: serde_json::Error) -> Self {
        DriverError::ConfigParse(e.to_string())
    }
}
