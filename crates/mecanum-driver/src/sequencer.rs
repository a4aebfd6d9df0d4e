//! 定时动作序列（自动阶段）
//!
//! 严格按顺序执行外部提供的动作列表：对每个动作，先向目标执行器下发命令，
//! 阻塞等待动作时长，再下发中性命令，然后进入下一个动作。
//!
//! - 序列在第一个动作执行之前整体校验，任何非法动作都会中止整个序列
//! - 执行器错误不重试：尝试把出错的执行器归零后返回 `ActionFailed`
//!
//! # 计划文件
//!
//! ```toml
//! scale = 1.0
//!
//! [[actions]]
//! device = "drive"
//! y = 1.0
//! duration = 0.5
//!
//! [[actions]]
//! device = "lift"
//! speed = 1.0
//! duration = 0.3
//! ```

use crate::buffer::clamp_scale;
use crate::error::DriverError;
use mecanum_hal::{ActuatorError, DriveCommand, DriveSink, LiftSink};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// 动作命令
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "lowercase")]
pub enum ActionCommand {
    /// 全向底盘命令
    Drive {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        rotation: f64,
    },
    /// 升降电机命令
    Lift { speed: f64 },
}

impl ActionCommand {
    fn values(&self) -> Vec<f64> {
        match *self {
            ActionCommand::Drive { x, y, rotation } => vec![x, y, rotation],
            ActionCommand::Lift { speed } => vec![speed],
        }
    }

    fn scaled(self, scale: f64) -> Self {
        match self {
            ActionCommand::Drive { x, y, rotation } => ActionCommand::Drive {
                x: x * scale,
                y: y * scale,
                rotation: rotation * scale,
            },
            ActionCommand::Lift { speed } => ActionCommand::Lift {
                speed: speed * scale,
            },
        }
    }

    /// 目标执行器名称（用于日志）
    pub fn device(&self) -> &'static str {
        match self {
            ActionCommand::Drive { .. } => "drive",
            ActionCommand::Lift { .. } => "lift",
        }
    }
}

/// 单个定时动作
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    pub command: ActionCommand,
    /// 持续时间（秒）
    pub duration: f64,
}

impl Action {
    pub fn drive(x: f64, y: f64, rotation: f64, duration: f64) -> Self {
        Self {
            command: ActionCommand::Drive { x, y, rotation },
            duration,
        }
    }

    pub fn lift(speed: f64, duration: f64) -> Self {
        Self {
            command: ActionCommand::Lift { speed },
            duration,
        }
    }

    fn validate(&self, index: usize) -> Result<Duration, DriverError> {
        let invalid = |reason: String| DriverError::InvalidAction { index, reason };

        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(invalid(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            )));
        }
        let duration = Duration::try_from_secs_f64(self.duration)
            .map_err(|e| invalid(format!("duration {} out of range: {}", self.duration, e)))?;

        for value in self.command.values() {
            if !value.is_finite() || value.abs() > 1.0 {
                return Err(invalid(format!(
                    "{} command {} outside [-1, 1]",
                    self.command.device(),
                    value
                )));
            }
        }

        Ok(duration)
    }
}

/// 动作计划（从配置文件加载）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    /// 全局速度缩放，按 `|scale|` 取值并限制到 1
    pub scale: f64,
    pub actions: Vec<Action>,
}

impl Default for ActionPlan {
    fn default() -> Self {
        Self {
            scale: 1.0,
            actions: Vec::new(),
        }
    }
}

impl ActionPlan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, DriverError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DriverError> {
        Ok(serde_json::from_str(s)?)
    }

    /// 按扩展名加载：`.json` 为 JSON，其他为 TOML
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// 校验全局缩放和全部动作（施加缩放之后）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: `scale` 不是有限数
    /// - `DriverError::InvalidAction`: 第一个非法动作的序号和原因
    pub fn validate(&self) -> Result<(), DriverError> {
        self.check_scale()?;
        ActionSequencer::validate(&self.scaled_actions())
    }

    fn check_scale(&self) -> Result<(), DriverError> {
        if !self.scale.is_finite() {
            return Err(DriverError::InvalidConfig(format!(
                "plan scale must be finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// 施加全局缩放后的动作列表
    pub fn scaled_actions(&self) -> Vec<Action> {
        let scale = clamp_scale(self.scale);
        self.actions
            .iter()
            .map(|a| Action {
                command: a.command.scaled(scale),
                duration: a.duration,
            })
            .collect()
    }

    /// 总时长（秒）
    pub fn total_duration(&self) -> f64 {
        self.actions.iter().map(|a| a.duration).sum()
    }
}

/// 执行报告
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceReport {
    pub actions_run: usize,
    pub elapsed: Duration,
}

/// 动作序列执行器
pub struct ActionSequencer {
    drive: Arc<dyn DriveSink>,
    lift: Arc<dyn LiftSink>,
    actions: Vec<(Action, Duration)>,
}

impl ActionSequencer {
    /// 创建执行器并校验全部动作
    ///
    /// # 错误
    /// - `DriverError::InvalidAction`: 第一个非法动作的序号和原因
    pub fn new(
        drive: Arc<dyn DriveSink>,
        lift: Arc<dyn LiftSink>,
        actions: Vec<Action>,
    ) -> Result<Self, DriverError> {
        let actions = actions
            .into_iter()
            .enumerate()
            .map(|(index, action)| action.validate(index).map(|d| (action, d)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            drive,
            lift,
            actions,
        })
    }

    /// 从动作计划创建（施加计划的全局缩放）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 计划的 `scale` 不是有限数
    /// - `DriverError::InvalidAction`: 第一个非法动作的序号和原因
    pub fn from_plan(
        drive: Arc<dyn DriveSink>,
        lift: Arc<dyn LiftSink>,
        plan: &ActionPlan,
    ) -> Result<Self, DriverError> {
        plan.check_scale()?;
        Self::new(drive, lift, plan.scaled_actions())
    }

    /// 只校验，不执行
    pub fn validate(actions: &[Action]) -> Result<(), DriverError> {
        for (index, action) in actions.iter().enumerate() {
            action.validate(index)?;
        }
        Ok(())
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().map(|(a, _)| a)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// 按顺序执行全部动作
    ///
    /// 每个动作：下发命令 → 等待时长 → 下发中性命令。动作之间没有重叠。
    ///
    /// # 错误
    /// - `DriverError::ActionFailed`: 某个动作的执行器命令失败，序列中止
    pub fn run_all(&self) -> Result<SequenceReport, DriverError> {
        let started = Instant::now();
        info!(actions = self.actions.len(), "Action sequence started");

        for (index, (action, duration)) in self.actions.iter().enumerate() {
            debug!(
                index,
                device = action.command.device(),
                duration = action.duration,
                "Running action"
            );

            if let Err(source) = self.issue(action.command) {
                self.neutralize(action.command);
                error!(index, "Action failed: {}", source);
                return Err(DriverError::ActionFailed { index, source });
            }

            spin_sleep::sleep(*duration);

            if let Err(source) = self.issue_neutral(action.command) {
                error!(index, "Failed to neutralize after action: {}", source);
                return Err(DriverError::ActionFailed { index, source });
            }
        }

        let report = SequenceReport {
            actions_run: self.actions.len(),
            elapsed: started.elapsed(),
        };
        info!(elapsed_ms = report.elapsed.as_millis() as u64, "Action sequence finished");
        Ok(report)
    }

    fn issue(&self, command: ActionCommand) -> Result<(), ActuatorError> {
        match command {
            ActionCommand::Drive { x, y, rotation } => {
                self.drive.drive(DriveCommand::new(x, y, rotation))
            },
            ActionCommand::Lift { speed } => self.lift.set_speed(speed),
        }
    }

    fn issue_neutral(&self, command: ActionCommand) -> Result<(), ActuatorError> {
        match command {
            ActionCommand::Drive { .. } => self.drive.drive(DriveCommand::NEUTRAL),
            ActionCommand::Lift { .. } => self.lift.set_speed(0.0),
        }
    }

    /// 出错后尽力归零；失败只记录日志
    fn neutralize(&self, command: ActionCommand) {
        if let Err(e) = self.issue_neutral(command) {
            error!("Failed to neutralize {}: {}", command.device(), e);
        }
    }
}

impl std::fmt::Debug for ActionSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSequencer")
            .field("actions", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecanum_hal::mock::{CommandLog, Recorded, RecordingDriveSink, RecordingLiftSink};

    fn sinks() -> (CommandLog, Arc<RecordingDriveSink>, Arc<RecordingLiftSink>) {
        let log = CommandLog::new();
        let drive = Arc::new(RecordingDriveSink::new(log.clone()));
        let lift = Arc::new(RecordingLiftSink::new(log.clone()));
        (log, drive, lift)
    }

    #[test]
    fn test_runs_in_order_with_neutral_between() {
        let (log, drive, lift) = sinks();
        let seq = ActionSequencer::new(
            drive,
            lift,
            vec![Action::drive(0.0, 1.0, 0.0, 0.0), Action::lift(1.0, 0.0)],
        )
        .unwrap();

        let report = seq.run_all().unwrap();
        assert_eq!(report.actions_run, 2);
        assert_eq!(
            log.commands(),
            vec![
                Recorded::Drive(DriveCommand::new(0.0, 1.0, 0.0)),
                Recorded::Drive(DriveCommand::NEUTRAL),
                Recorded::Lift(1.0),
                Recorded::Lift(0.0),
            ]
        );
    }

    #[test]
    fn test_negative_duration_rejected_before_running() {
        let (log, drive, lift) = sinks();
        let err = ActionSequencer::new(
            drive,
            lift,
            vec![Action::lift(1.0, 0.1), Action::drive(0.0, 1.0, 0.0, -0.5)],
        )
        .unwrap_err();

        match err {
            DriverError::InvalidAction { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {}", other),
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_out_of_range_command_rejected() {
        let actions = [Action::drive(1.5, 0.0, 0.0, 0.1)];
        assert!(matches!(
            ActionSequencer::validate(&actions),
            Err(DriverError::InvalidAction { index: 0, .. })
        ));
        let actions = [Action::lift(f64::NAN, 0.1)];
        assert!(ActionSequencer::validate(&actions).is_err());
        let actions = [Action::lift(0.5, f64::INFINITY)];
        assert!(ActionSequencer::validate(&actions).is_err());
    }

    #[test]
    fn test_failure_aborts_sequence() {
        let (log, drive, lift) = sinks();
        lift.set_failing(true);
        let seq = ActionSequencer::new(
            drive.clone(),
            lift,
            vec![
                Action::drive(0.0, 0.5, 0.0, 0.0),
                Action::lift(1.0, 0.0),
                Action::drive(0.5, 0.0, 0.0, 0.0),
            ],
        )
        .unwrap();

        let err = seq.run_all().unwrap_err();
        assert!(matches!(err, DriverError::ActionFailed { index: 1, .. }));
        // 第三个动作没有执行
        assert_eq!(log.len(), 2);
        assert_eq!(drive.last_command(), Some(DriveCommand::NEUTRAL));
    }

    #[test]
    fn test_empty_sequence() {
        let (log, drive, lift) = sinks();
        let seq = ActionSequencer::new(drive, lift, Vec::new()).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.run_all().unwrap().actions_run, 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_plan_from_toml() {
        let plan = ActionPlan::from_toml_str(
            r#"
            scale = 0.5

            [[actions]]
            device = "drive"
            y = 1.0
            duration = 0.5

            [[actions]]
            device = "lift"
            speed = -1.0
            duration = 0.3
            "#,
        )
        .unwrap();

        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.actions[0], Action::drive(0.0, 1.0, 0.0, 0.5));
        assert_eq!(plan.actions[1], Action::lift(-1.0, 0.3));
        assert!((plan.total_duration() - 0.8).abs() < 1e-9);

        let scaled = plan.scaled_actions();
        assert_eq!(scaled[0], Action::drive(0.0, 0.5, 0.0, 0.5));
        assert_eq!(scaled[1], Action::lift(-0.5, 0.3));
    }

    #[test]
    fn test_plan_scale_normalised() {
        let plan = ActionPlan {
            scale: -3.0,
            actions: vec![Action::lift(0.8, 0.0)],
        };
        assert_eq!(plan.scaled_actions()[0], Action::lift(0.8, 0.0));
    }

    #[test]
    fn test_plan_non_finite_scale_rejected() {
        let plan = ActionPlan::from_toml_str(
            r#"
            scale = nan

            [[actions]]
            device = "drive"
            y = 1.0
            duration = 0.0
            "#,
        )
        .unwrap();
        assert!(matches!(plan.validate(), Err(DriverError::InvalidConfig(_))));

        let (log, drive, lift) = sinks();
        let err = ActionSequencer::from_plan(drive, lift, &plan).unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
        assert!(log.is_empty());

        let plan = ActionPlan {
            scale: f64::INFINITY,
            actions: Vec::new(),
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_plan_validate_checks_scaled_actions() {
        let plan = ActionPlan::new(vec![Action::lift(0.5, 0.1), Action::lift(0.5, -1.0)]);
        assert!(matches!(
            plan.validate(),
            Err(DriverError::InvalidAction { index: 1, .. })
        ));
        assert!(ActionPlan::new(vec![Action::lift(0.5, 0.1)]).validate().is_ok());
    }

    #[test]
    fn test_plan_from_json() {
        let plan = ActionPlan::from_json_str(
            r#"{"actions": [{"device": "lift", "speed": 1.0, "duration": 0.3}]}"#,
        )
        .unwrap();
        assert_eq!(plan.scale, 1.0);
        assert_eq!(plan.actions, vec![Action::lift(1.0, 0.3)]);
    }

    #[test]
    fn test_plan_unknown_device_rejected() {
        let err = ActionPlan::from_json_str(
            r#"{"actions": [{"device": "arm", "speed": 1.0, "duration": 0.3}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::ConfigParse(_)));
    }

    #[test]
    fn test_plan_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(
            &path,
            r#"{"actions": [{"device": "drive", "x": -1.0, "duration": 1.5}]}"#,
        )
        .unwrap();
        let plan = ActionPlan::load_from_file(&path).unwrap();
        assert_eq!(plan.actions, vec![Action::drive(-1.0, 0.0, 0.0, 1.5)]);

        let missing = ActionPlan::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(DriverError::Io(_))));
    }
}
