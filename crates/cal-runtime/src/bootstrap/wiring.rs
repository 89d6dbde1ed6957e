//! # Dependency Injection
//!
//! Builds the concrete adapters and hands them to the application layer as
//! port trait objects. This is the only module that depends on `cal-app`
//! and `cal-infra` at the same time; it assembles, it does not decide.

use std::sync::Arc;

use tokio::runtime::Handle;

use cal_app::{CalibrationOrchestrator, CalibrationPorts, StartupResolver, VerificationCoordinator};
use cal_core::config::CalibratorConfig;
use cal_core::ports::SettingsPort;
use cal_infra::{
    CalibrationMarker, DirectoryContentLauncher, FileDeviceCapabilityProvider,
    FileSettingsRepository, TcpReachabilityLink,
};

use crate::adapters::{
    ConsoleCalibrationView, ConsoleNetworkIndicators, HeadlessDisplayRig, OperatorFeed,
    OperatorQueue, TimedAudioSelfTest,
};

pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency assembly.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Settings repository initialization failed: {0}")]
    SettingsInit(#[source] anyhow::Error),
}

/// Everything the run loop needs, fully assembled.
pub struct CalibratorDeps {
    pub startup: StartupResolver,
    pub orchestrator: CalibrationOrchestrator,
    pub operator: OperatorQueue,
    /// Handed to whatever reads operator lines (stdin in production).
    pub operator_feed: OperatorFeed,
}

/// Wire all adapters from `config`.
///
/// Verification attempts are spawned on `runtime`.
pub fn wire_dependencies(config: &CalibratorConfig, runtime: Handle) -> WiringResult<CalibratorDeps> {
    let marker = CalibrationMarker::new(&config.paths.calibration_file);

    let settings_repo = Arc::new(FileSettingsRepository::new(&config.paths.settings_file));
    let settings = settings_repo.load().map_err(WiringError::SettingsInit)?;

    let (operator, operator_feed) = OperatorQueue::new();

    let startup = StartupResolver::new(
        Arc::new(FileDeviceCapabilityProvider::new(config.device_class, marker.clone())),
        Arc::new(operator.override_switch()),
        config.force_recalibrate,
        config.startup_grace_period,
    );

    let ports = CalibrationPorts {
        display_rig: Arc::new(HeadlessDisplayRig::new(marker)),
        audio: Arc::new(TimedAudioSelfTest::new(config.audio_test_duration)),
        settings: settings_repo,
        view: Arc::new(ConsoleCalibrationView),
        indicators: Arc::new(ConsoleNetworkIndicators::default()),
        content: Arc::new(DirectoryContentLauncher::new(&config.paths.packages_dir)),
    };

    let link = Arc::new(TcpReachabilityLink::new(
        config.verification.port,
        config.verification.connect_timeout,
    ));
    let verifier = VerificationCoordinator::new(link, config.verification.clone(), runtime);

    Ok(CalibratorDeps {
        startup,
        orchestrator: CalibrationOrchestrator::new(ports, verifier, settings),
        operator,
        operator_feed,
    })
}
