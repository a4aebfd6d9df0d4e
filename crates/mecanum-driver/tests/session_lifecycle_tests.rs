//! 手动控制会话生命周期测试
//!
//! 验证：
//! 1. 后台循环在 start 后生效（朝向翻转、缩放调整、升降跟随扳机）
//! 2. stop 按相反顺序停止，升降电机和底盘最后收到的都是 0
//! 3. run() 在外部标志清零后返回
//! 4. 另一线程上的 run() 仍在运行时调用 stop()，底盘最后收到的仍是中性命令

use mecanum_driver::{
    Authority, Devices, EventHook, SessionConfig, SessionEvent, TeleopMode, TeleopSession,
};
use mecanum_hal::DriveCommand;
use mecanum_hal::layout::*;
use mecanum_hal::mock::{
    CommandLog, MockLimitSwitch, RecordingDriveSink, RecordingLiftSink, ScriptedInput,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

struct Rig {
    primary: Arc<ScriptedInput>,
    secondary: Arc<ScriptedInput>,
    drive: Arc<RecordingDriveSink>,
    lift: Arc<RecordingLiftSink>,
    limit: Arc<MockLimitSwitch>,
}

impl Rig {
    fn new() -> Self {
        let log = CommandLog::new();
        Self {
            primary: ScriptedInput::shared(),
            secondary: ScriptedInput::shared(),
            drive: Arc::new(RecordingDriveSink::new(log.clone())),
            lift: Arc::new(RecordingLiftSink::new(log)),
            limit: Arc::new(MockLimitSwitch::new(false)),
        }
    }

    fn devices(&self) -> Devices {
        Devices {
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
            drive: self.drive.clone(),
            lift: self.lift.clone(),
            lift_limit: self.limit.clone(),
        }
    }
}

fn config(mode: TeleopMode) -> SessionConfig {
    let mut config = SessionConfig::default().with_mode(mode);
    config.period_ms = 2;
    config
}

#[test]
fn test_background_loops_feed_snapshot() {
    let rig = Rig::new();
    let (hook, rx) = EventHook::new(64);
    let session =
        TeleopSession::with_event_hook(config(TeleopMode::Restricted), rig.devices(), hook)
            .unwrap();
    session.start().unwrap();
    assert!(session.orientation());

    rig.primary.set_button(A_BUTTON, true);
    rig.primary.set_button(RIGHT_BUMPER, true);
    thread::sleep(Duration::from_millis(30));
    rig.primary.set_button(A_BUTTON, false);
    rig.primary.set_button(RIGHT_BUMPER, false);
    thread::sleep(Duration::from_millis(10));

    assert!(!session.orientation());
    assert!((session.scale() - 0.5).abs() < 1e-9);

    session.stop();

    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert!(events.contains(&SessionEvent::OrientationChanged { inverted: false }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::ScaleChanged { scale } if (scale - 0.5).abs() < 1e-9))
    );
}

#[test]
fn test_stop_zeroes_lift_and_drive() {
    let rig = Rig::new();
    let session = TeleopSession::new(config(TeleopMode::Standard), rig.devices()).unwrap();

    // Standard 模式：升降直接由副手柄控制
    rig.secondary.set_axis(LEFT_TRIGGER_AXIS, 0.9);
    session.start().unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(rig.lift.last_speed(), Some(0.9));

    rig.primary.set_axis(LEFT_Y_AXIS, 1.0);
    session.tick().unwrap();
    assert!(!rig.drive.last_command().unwrap().is_neutral());

    session.stop();
    assert_eq!(rig.lift.last_speed(), Some(0.0));
    assert_eq!(rig.drive.last_command(), Some(DriveCommand::NEUTRAL));
    assert!(session.metrics().snapshot().lift_cycles > 0);
}

#[test]
fn test_override_moves_lift_to_secondary() {
    let rig = Rig::new();
    let session = TeleopSession::new(config(TeleopMode::Restricted), rig.devices()).unwrap();
    rig.primary.set_axis(LEFT_TRIGGER_AXIS, 0.2);
    rig.secondary.set_axis(RIGHT_TRIGGER_AXIS, 0.6);
    session.start().unwrap();

    thread::sleep(Duration::from_millis(15));
    assert_eq!(rig.lift.last_speed(), Some(0.2));

    rig.primary.set_button(B_BUTTON, true);
    session.tick().unwrap();
    rig.primary.set_button(B_BUTTON, false);
    assert_eq!(session.authority(), Authority::Secondary);

    thread::sleep(Duration::from_millis(15));
    assert_eq!(rig.lift.last_speed(), Some(-0.6));

    // 副手柄按下释放按钮，控制权回到主手柄
    rig.secondary.set_button(Y_BUTTON, true);
    thread::sleep(Duration::from_millis(15));
    assert_eq!(session.authority(), Authority::Primary);

    session.stop();
    let snapshot = session.metrics().snapshot();
    assert_eq!(snapshot.traps, 1);
    assert_eq!(snapshot.releases, 1);
}

#[test]
fn test_limit_switch_during_session() {
    let rig = Rig::new();
    let session = TeleopSession::new(config(TeleopMode::Standard), rig.devices()).unwrap();
    rig.limit.set_triggered(true);
    rig.secondary.set_axis(RIGHT_TRIGGER_AXIS, 1.0);
    session.start().unwrap();
    thread::sleep(Duration::from_millis(15));

    assert!(rig.lift.speeds().iter().all(|s| *s == 0.0));
    assert!(session.metrics().snapshot().limit_clamps > 0);
    session.stop();
}

#[test]
fn test_run_until_flag_drops() {
    let rig = Rig::new();
    let session = Arc::new(TeleopSession::new(config(TeleopMode::Guest), rig.devices()).unwrap());
    let running = Arc::new(AtomicBool::new(true));
    session.start().unwrap();

    let handle = {
        let session = session.clone();
        let running = running.clone();
        thread::spawn(move || session.run(&running))
    };

    rig.primary.set_axis(LEFT_X_AXIS, 1.0);
    thread::sleep(Duration::from_millis(30));
    running.store(false, Ordering::Release);
    handle.join().unwrap();

    assert!(session.metrics().snapshot().control_cycles > 0);
    let last = rig.drive.last_command().unwrap();
    assert!((last.x - -0.4).abs() < 1e-9, "{:?}", last);

    session.stop();
    assert_eq!(rig.drive.last_command(), Some(DriveCommand::NEUTRAL));
}

#[test]
fn test_stop_ends_concurrent_run() {
    let rig = Rig::new();
    let session =
        Arc::new(TeleopSession::new(config(TeleopMode::Standard), rig.devices()).unwrap());
    // 外部标志保持为 true，只靠 stop() 结束 run()
    let running = Arc::new(AtomicBool::new(true));
    rig.primary.set_axis(LEFT_Y_AXIS, 1.0);
    session.start().unwrap();

    let handle = {
        let session = session.clone();
        let running = running.clone();
        thread::spawn(move || session.run(&running))
    };

    thread::sleep(Duration::from_millis(20));
    assert!(!rig.drive.last_command().unwrap().is_neutral());

    session.stop();
    assert_eq!(rig.drive.last_command(), Some(DriveCommand::NEUTRAL));

    thread::sleep(Duration::from_millis(20));
    assert!(handle.is_finished());
    handle.join().unwrap();
    assert!(running.load(Ordering::Acquire));
    assert_eq!(rig.drive.last_command(), Some(DriveCommand::NEUTRAL));
}

#[test]
fn test_drop_stops_session() {
    let rig = Rig::new();
    rig.secondary.set_axis(LEFT_TRIGGER_AXIS, 0.5);
    {
        let session = TeleopSession::new(config(TeleopMode::Standard), rig.devices()).unwrap();
        session.start().unwrap();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(rig.lift.last_speed(), Some(0.0));

    let count = rig.lift.speeds().len();
    thread::sleep(Duration::from_millis(10));
    assert_eq!(rig.lift.speeds().len(), count);
}
