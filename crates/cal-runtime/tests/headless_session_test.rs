use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::time::sleep;

use cal_core::config::CalibratorConfig;
use cal_core::ports::SettingsPort;
use cal_core::{CalibrationState, DeviceClass};
use cal_infra::{CalibrationMarker, FileSettingsRepository};
use cal_runtime::adapters::{OperatorCommand, OperatorFeed};
use cal_runtime::bootstrap::{run_session, wire_dependencies};

const TICK: Duration = Duration::from_millis(5);
const STEP: Duration = Duration::from_millis(60);

async fn content_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    port
}

fn config_in(dir: &Path, port: u16) -> CalibratorConfig {
    let mut config = CalibratorConfig::default();
    config.device_class = DeviceClass::ManualCalibration;
    config.tick_interval = TICK;
    config.startup_grace_period = Duration::from_millis(100);
    config.audio_test_duration = Duration::from_millis(20);
    config.verification.poll_interval = Duration::from_millis(10);
    config.verification.port = port;
    config.verification.connect_timeout = Duration::from_secs(2);
    config.paths.settings_file = dir.join("settings.json");
    config.paths.calibration_file = dir.join("calibration.json");
    config.paths.packages_dir = dir.join("packages");
    config
}

/// Send `commands` one step apart, then quit.
fn script(feed: OperatorFeed, commands: Vec<OperatorCommand>) {
    tokio::spawn(async move {
        for command in commands {
            sleep(STEP).await;
            feed.send(command);
        }
        sleep(STEP * 5).await;
        feed.send(OperatorCommand::Quit);
    });
}

async fn run(config: &CalibratorConfig, commands: Vec<OperatorCommand>) -> CalibrationState {
    let mut deps = wire_dependencies(config, Handle::current()).unwrap();
    script(deps.operator_feed.clone(), commands);
    run_session(&mut deps, config.tick_interval, std::future::pending())
        .await
        .unwrap()
}

#[tokio::test]
async fn first_boot_runs_the_full_flow_and_second_boot_skips_it() {
    let dir = TempDir::new().unwrap();
    let port = content_server().await;
    let config = config_in(dir.path(), port);

    let first = run(
        &config,
        vec![
            OperatorCommand::Confirm,
            OperatorCommand::Confirm,
            OperatorCommand::Confirm,
            OperatorCommand::Confirm,
            // Audio self-test finishes on its own.
            OperatorCommand::Host("127.0.0.1".to_string()),
            OperatorCommand::Confirm,
        ],
    )
    .await;

    assert_eq!(first, CalibrationState::Initialized);
    assert!(CalibrationMarker::new(&config.paths.calibration_file).exists());
    let saved = FileSettingsRepository::new(&config.paths.settings_file)
        .load()
        .unwrap();
    assert_eq!(saved.network.content_hostname, "127.0.0.1");

    // Calibrated now: grace period passes without override, the saved
    // hostname verifies and the flow lands in Initialized on its own.
    let second = run(&config, Vec::new()).await;

    assert_eq!(second, CalibrationState::Initialized);
}

#[tokio::test]
async fn override_during_grace_period_forces_recalibration() {
    let dir = TempDir::new().unwrap();
    let port = content_server().await;
    let config = config_in(dir.path(), port);
    CalibrationMarker::new(&config.paths.calibration_file)
        .record(true)
        .unwrap();

    let mut deps = wire_dependencies(&config, Handle::current()).unwrap();
    deps.operator_feed.send(OperatorCommand::Override);
    script(deps.operator_feed.clone(), Vec::new());
    let state = run_session(&mut deps, config.tick_interval, std::future::pending())
        .await
        .unwrap();

    assert_eq!(state, CalibrationState::PhysicalAlignment);
}

#[tokio::test]
async fn input_typed_during_grace_period_is_discarded() {
    let dir = TempDir::new().unwrap();
    let port = content_server().await;
    let config = config_in(dir.path(), port);
    CalibrationMarker::new(&config.paths.calibration_file)
        .record(true)
        .unwrap();

    let mut deps = wire_dependencies(&config, Handle::current()).unwrap();
    // Enter pressed before the alignment prompt was ever shown.
    deps.operator_feed.send(OperatorCommand::Confirm);
    deps.operator_feed.send(OperatorCommand::Host("early.local".to_string()));
    deps.operator_feed.send(OperatorCommand::Override);
    script(deps.operator_feed.clone(), Vec::new());
    let state = run_session(&mut deps, config.tick_interval, std::future::pending())
        .await
        .unwrap();

    assert_eq!(state, CalibrationState::PhysicalAlignment);
    assert_eq!(deps.orchestrator.settings().network.content_hostname, "");
}

#[tokio::test]
async fn quit_during_grace_period_stops_before_the_first_tick() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path(), 1);
    CalibrationMarker::new(&config.paths.calibration_file)
        .record(true)
        .unwrap();

    let mut deps = wire_dependencies(&config, Handle::current()).unwrap();
    deps.operator_feed.send(OperatorCommand::Confirm);
    deps.operator_feed.send(OperatorCommand::Quit);
    let state = run_session(&mut deps, config.tick_interval, std::future::pending())
        .await
        .unwrap();

    assert_eq!(state, CalibrationState::NetworkConfiguration);
}

#[tokio::test]
async fn unreachable_host_returns_to_network_configuration() {
    let dir = TempDir::new().unwrap();
    // Bind and drop so nothing listens on the port.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut config = config_in(dir.path(), port);
    config.device_class = DeviceClass::PreCalibrated;
    // Input typed during the grace window is discarded.
    config.startup_grace_period = Duration::ZERO;

    let state = run(
        &config,
        vec![
            OperatorCommand::Host("127.0.0.1".to_string()),
            OperatorCommand::Confirm,
        ],
    )
    .await;

    assert_eq!(state, CalibrationState::NetworkConfiguration);
    let saved = FileSettingsRepository::new(&config.paths.settings_file)
        .load()
        .unwrap();
    assert_eq!(saved.network.content_hostname, "");
}

#[tokio::test]
async fn shutdown_during_startup_leaves_flow_uninitialized() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path(), 1);
    config.startup_grace_period = Duration::from_secs(60);
    CalibrationMarker::new(&config.paths.calibration_file)
        .record(true)
        .unwrap();

    let mut deps = wire_dependencies(&config, Handle::current()).unwrap();
    let state = run_session(&mut deps, config.tick_interval, sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    assert_eq!(state, CalibrationState::Uninitialized);
}
