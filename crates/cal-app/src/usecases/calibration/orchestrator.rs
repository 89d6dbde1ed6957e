//! Calibration orchestrator.
//!
//! This module coordinates the calibration state machine and its side
//! effects. It is driven by a single tick loop: [`CalibrationOrchestrator::tick`]
//! never awaits, and the only cross-thread input it reads is the latest
//! verification snapshot.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn};

use cal_core::calibration::{
    CalibrationAction, CalibrationState, CalibrationStateMachine, OperatorInput, TickFacts,
};
use cal_core::device::{self, DeviceClass};
use cal_core::network::VerificationSnapshot;
use cal_core::ports::{
    AudioSelfTestPort, AudioTestHandle, CalibrationViewPort, DisplayRigPort, NetworkIndicatorPort,
    RigReadiness, SettingsPort, StartupContentPort,
};
use cal_core::settings::Settings;

use crate::usecases::calibration::startup::StartupPlan;
use crate::usecases::calibration::verification::VerificationCoordinator;

/// Errors produced by the calibration orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no supported display rig: {reason}")]
    UnsupportedRig { reason: String },
    #[error("persisting {what} failed: {source}")]
    Persistence {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl OrchestratorError {
    /// Fatal errors stop the orchestrator; everything else is retried on a
    /// later tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrchestratorError::UnsupportedRig { .. })
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Display rig not ready yet; nothing was evaluated.
    RigPending,
    Stayed(CalibrationState),
    Moved {
        from: CalibrationState,
        to: CalibrationState,
    },
}

/// Collaborators driven from the tick loop.
#[derive(Clone)]
pub struct CalibrationPorts {
    pub display_rig: Arc<dyn DisplayRigPort>,
    pub audio: Arc<dyn AudioSelfTestPort>,
    pub settings: Arc<dyn SettingsPort>,
    pub view: Arc<dyn CalibrationViewPort>,
    pub indicators: Arc<dyn NetworkIndicatorPort>,
    pub content: Arc<dyn StartupContentPort>,
}

/// Orchestrator that drives calibration state and side effects.
pub struct CalibrationOrchestrator {
    state: CalibrationState,
    device_class: DeviceClass,
    settings: Settings,
    audio_test: Option<AudioTestHandle>,
    verifier: VerificationCoordinator,
    ports: CalibrationPorts,
}

impl CalibrationOrchestrator {
    pub fn new(ports: CalibrationPorts, verifier: VerificationCoordinator, settings: Settings) -> Self {
        Self {
            state: CalibrationState::Uninitialized,
            device_class: DeviceClass::Unknown,
            settings,
            audio_test: None,
            verifier,
            ports,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn verification(&self) -> VerificationSnapshot {
        self.verifier.latest()
    }

    /// Receiver that observes verification outcomes as they are published.
    pub fn subscribe_verification(&self) -> watch::Receiver<VerificationSnapshot> {
        self.verifier.subscribe()
    }

    /// Update the hostname typed into the network configuration view.
    ///
    /// Only accepted while that view is active, so the hostname under
    /// verification is the one persisted on success. Returns whether the
    /// edit was applied.
    pub fn set_content_hostname(&mut self, hostname: impl Into<String>) -> bool {
        if self.state != CalibrationState::NetworkConfiguration {
            debug!(state = %self.state, "hostname edit ignored outside network configuration");
            return false;
        }
        self.settings.network.content_hostname = hostname.into();
        true
    }

    /// Enter the first state according to the startup plan.
    pub fn begin(&mut self, plan: &StartupPlan) -> Result<CalibrationState, OrchestratorError> {
        let _span = info_span!("usecase.calibration.begin", calibrated = plan.calibrated).entered();
        self.device_class = plan.profile.class;

        let content_launched = plan.calibrated && self.launch_startup_package();
        let (next, actions) = CalibrationStateMachine::begin(
            plan.calibrated,
            content_launched,
            &self.settings.network.content_hostname,
        );
        info!(to = %next, content_launched, "calibration flow starting");

        self.execute_actions(actions)?;
        self.set_state_and_emit(next);
        Ok(next)
    }

    /// Evaluate one tick: at most one transition.
    pub fn tick(&mut self, input: OperatorInput) -> Result<TickOutcome, OrchestratorError> {
        match self.ports.display_rig.readiness() {
            RigReadiness::Pending => return Ok(TickOutcome::RigPending),
            RigReadiness::Unsupported { reason } => {
                error!(reason = %reason, "display does not expose a supported calibration rig");
                return Err(OrchestratorError::UnsupportedRig { reason });
            }
            RigReadiness::Ready => {}
        }

        let audio_finished = self
            .audio_test
            .map(|handle| self.ports.audio.is_finished(handle))
            .unwrap_or(false);

        let from = self.state;
        let event = {
            let facts = TickFacts {
                input,
                auto_skip: device::auto_skip_manual_steps(self.device_class),
                audio_finished,
                hostname: &self.settings.network.content_hostname,
                verification: self.verifier.latest().state,
            };
            CalibrationStateMachine::select_event(from, &facts)
        };

        let Some(event) = event else {
            self.execute_actions(CalibrationStateMachine::steady_actions(from))?;
            return Ok(TickOutcome::Stayed(from));
        };

        let event_name = format!("{:?}", event);
        let (next, actions) = CalibrationStateMachine::transition(from, event);
        if next == from && actions.is_empty() {
            debug!(state = %from, event = %event_name, "calibration event ignored");
            return Ok(TickOutcome::Stayed(from));
        }

        info!(from = %from, to = %next, event = %event_name, "calibration state transition");
        // Side effects run strictly before the state is committed.
        self.execute_actions(actions)?;

        if next == from {
            return Ok(TickOutcome::Stayed(from));
        }
        self.set_state_and_emit(next);
        Ok(TickOutcome::Moved { from, to: next })
    }

    fn execute_actions(&mut self, actions: Vec<CalibrationAction>) -> Result<(), OrchestratorError> {
        for action in actions {
            match action {
                CalibrationAction::DisableBlending => self.ports.display_rig.set_blending(false),
                CalibrationAction::EnableBlending => self.ports.display_rig.set_blending(true),
                CalibrationAction::StartAudioTest => {
                    let handle = self.ports.audio.start();
                    debug!(?handle, "audio self-test started");
                    self.audio_test = Some(handle);
                }
                CalibrationAction::SaveDisplaySettings => {
                    self.ports.display_rig.save_settings().map_err(|source| {
                        error!(error = %source, "saving display settings failed");
                        OrchestratorError::Persistence {
                            what: "display settings",
                            source,
                        }
                    })?;
                }
                CalibrationAction::ClearNetworkIndicators => {
                    self.ports.indicators.set_connectivity_warning(false);
                    self.ports.indicators.set_authorization_denied(false);
                }
                CalibrationAction::StartVerification { hostname } => {
                    let attempt = self.verifier.start(&hostname);
                    info!(attempt, hostname = %hostname, "network verification started");
                }
                CalibrationAction::ShowConnectivityWarning => {
                    warn!("content server unreachable");
                    self.ports.indicators.set_connectivity_warning(true);
                }
                CalibrationAction::ShowAuthorizationDenied => {
                    warn!("content server denied this device");
                    self.ports.indicators.set_authorization_denied(true);
                }
                CalibrationAction::SaveNetworkSettings => {
                    self.ports.settings.save(&self.settings).map_err(|source| {
                        error!(error = %source, "saving network settings failed");
                        OrchestratorError::Persistence {
                            what: "network settings",
                            source,
                        }
                    })?;
                }
                CalibrationAction::EnableSoftwareCompensation => {
                    self.ports.display_rig.set_software_compensation(true)
                }
                CalibrationAction::DisableSoftwareCompensation => {
                    self.ports.display_rig.set_software_compensation(false)
                }
            }
        }
        Ok(())
    }

    fn set_state_and_emit(&mut self, state: CalibrationState) {
        let from = self.state;
        if from == state {
            return;
        }
        self.state = state;
        self.ports.view.on_state_changed(from, state);
    }

    fn launch_startup_package(&self) -> bool {
        let Some(name) = self
            .settings
            .network
            .startup_package
            .as_deref()
            .filter(|name| !name.trim().is_empty())
        else {
            return false;
        };

        match self.ports.content.launch_startup_package(name) {
            Ok(true) => {
                info!(package = %name, "startup package launched");
                true
            }
            Ok(false) => {
                warn!(package = %name, "startup package not found, continuing calibration");
                false
            }
            Err(err) => {
                error!(package = %name, error = %err, "launching startup package failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cal_core::config::VerificationConfig;
    use cal_core::device::DeviceCapabilityProfile;
    use cal_core::network::ConnectionPhase;
    use cal_core::ports::NetworkLinkPort;
    use std::sync::Mutex as StdMutex;
    use tokio::runtime::Handle;

    mockall::mock! {
        pub SettingsStore {}

        impl SettingsPort for SettingsStore {
            fn load(&self) -> anyhow::Result<Settings>;
            fn save(&self, settings: &Settings) -> anyhow::Result<()>;
        }
    }

    mockall::mock! {
        pub Content {}

        impl StartupContentPort for Content {
            fn launch_startup_package(&self, name: &str) -> anyhow::Result<bool>;
        }
    }

    #[derive(Default)]
    struct RecordingRig {
        readiness: StdMutex<Option<RigReadiness>>,
        calls: StdMutex<Vec<String>>,
    }

    impl DisplayRigPort for RecordingRig {
        fn readiness(&self) -> RigReadiness {
            self.readiness.lock().unwrap().clone().unwrap_or(RigReadiness::Ready)
        }

        fn save_settings(&self) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push("save".into());
            Ok(())
        }

        fn set_blending(&self, enabled: bool) {
            self.calls.lock().unwrap().push(format!("blending:{enabled}"));
        }

        fn set_software_compensation(&self, enabled: bool) {
            self.calls.lock().unwrap().push(format!("compensation:{enabled}"));
        }
    }

    struct NeverFinishes;

    impl AudioSelfTestPort for NeverFinishes {
        fn start(&self) -> AudioTestHandle {
            AudioTestHandle(1)
        }

        fn is_finished(&self, _handle: AudioTestHandle) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct RecordingView {
        changes: StdMutex<Vec<(CalibrationState, CalibrationState)>>,
    }

    impl CalibrationViewPort for RecordingView {
        fn on_state_changed(&self, from: CalibrationState, to: CalibrationState) {
            self.changes.lock().unwrap().push((from, to));
        }
    }

    struct SilentIndicators;

    impl NetworkIndicatorPort for SilentIndicators {
        fn set_connectivity_warning(&self, _visible: bool) {}
        fn set_authorization_denied(&self, _visible: bool) {}
    }

    /// Link that always reports the same phase right after connecting.
    struct FixedLink(ConnectionPhase);

    #[async_trait]
    impl NetworkLinkPort for FixedLink {
        async fn connect(&self, _hostname: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn connection_phase(&self) -> anyhow::Result<ConnectionPhase> {
            Ok(self.0)
        }
    }

    fn build(
        rig: Arc<RecordingRig>,
        view: Arc<RecordingView>,
        settings_port: MockSettingsStore,
        content: MockContent,
        settings: Settings,
    ) -> CalibrationOrchestrator {
        let ports = CalibrationPorts {
            display_rig: rig,
            audio: Arc::new(NeverFinishes),
            settings: Arc::new(settings_port),
            view,
            indicators: Arc::new(SilentIndicators),
            content: Arc::new(content),
        };
        let verifier = VerificationCoordinator::new(
            Arc::new(FixedLink(ConnectionPhase::Verified)),
            VerificationConfig::default(),
            Handle::current(),
        );
        CalibrationOrchestrator::new(ports, verifier, settings)
    }

    fn plan(class: DeviceClass, calibrated: bool) -> StartupPlan {
        StartupPlan {
            profile: DeviceCapabilityProfile {
                class,
                has_persisted_calibration: calibrated,
            },
            calibrated,
            operator_override: false,
        }
    }

    #[tokio::test]
    async fn pending_rig_makes_tick_a_no_op() {
        let rig = Arc::new(RecordingRig::default());
        *rig.readiness.lock().unwrap() = Some(RigReadiness::Pending);
        let view = Arc::new(RecordingView::default());
        let mut orchestrator = build(
            Arc::clone(&rig),
            Arc::clone(&view),
            MockSettingsStore::new(),
            MockContent::new(),
            Settings::default(),
        );
        orchestrator.begin(&plan(DeviceClass::ManualCalibration, false)).unwrap();

        let outcome = orchestrator.tick(OperatorInput::confirm()).unwrap();

        assert_eq!(outcome, TickOutcome::RigPending);
        assert_eq!(orchestrator.state(), CalibrationState::PhysicalAlignment);
    }

    #[tokio::test]
    async fn unsupported_rig_is_fatal() {
        let rig = Arc::new(RecordingRig::default());
        *rig.readiness.lock().unwrap() = Some(RigReadiness::Unsupported {
            reason: "plain monitor".into(),
        });
        let mut orchestrator = build(
            rig,
            Arc::new(RecordingView::default()),
            MockSettingsStore::new(),
            MockContent::new(),
            Settings::default(),
        );

        let err = orchestrator.tick(OperatorInput::default()).unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("plain monitor"));
    }

    #[tokio::test]
    async fn uncalibrated_start_enables_software_compensation() {
        let rig = Arc::new(RecordingRig::default());
        let view = Arc::new(RecordingView::default());
        let mut orchestrator = build(
            Arc::clone(&rig),
            Arc::clone(&view),
            MockSettingsStore::new(),
            MockContent::new(),
            Settings::default(),
        );

        let state = orchestrator.begin(&plan(DeviceClass::ManualCalibration, false)).unwrap();

        assert_eq!(state, CalibrationState::PhysicalAlignment);
        assert_eq!(*rig.calls.lock().unwrap(), vec!["compensation:true".to_string()]);
        assert_eq!(
            *view.changes.lock().unwrap(),
            vec![(CalibrationState::Uninitialized, CalibrationState::PhysicalAlignment)]
        );
    }

    #[tokio::test]
    async fn calibrated_start_launches_startup_package_and_stays_uninitialized() {
        let mut content = MockContent::new();
        content
            .expect_launch_startup_package()
            .withf(|name| name == "lobby-loop")
            .times(1)
            .returning(|_| Ok(true));
        let mut settings = Settings::default();
        settings.network.startup_package = Some("lobby-loop".into());
        settings.network.content_hostname = "content.local".into();
        let view = Arc::new(RecordingView::default());
        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::clone(&view),
            MockSettingsStore::new(),
            content,
            settings,
        );

        let state = orchestrator.begin(&plan(DeviceClass::PreCalibrated, true)).unwrap();

        assert_eq!(state, CalibrationState::Uninitialized);
        assert!(view.changes.lock().unwrap().is_empty());
        assert_eq!(orchestrator.verification().attempt, 0);
    }

    #[tokio::test]
    async fn missing_startup_package_falls_through_to_network_configuration() {
        let mut content = MockContent::new();
        content
            .expect_launch_startup_package()
            .times(1)
            .returning(|_| Ok(false));
        let mut settings = Settings::default();
        settings.network.startup_package = Some("gone".into());
        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::new(RecordingView::default()),
            MockSettingsStore::new(),
            content,
            settings,
        );

        let state = orchestrator.begin(&plan(DeviceClass::PreCalibrated, true)).unwrap();

        assert_eq!(state, CalibrationState::NetworkConfiguration);
    }

    #[tokio::test]
    async fn calibrated_start_with_hostname_starts_verification() {
        let mut settings = Settings::default();
        settings.network.content_hostname = "content.local".into();
        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::new(RecordingView::default()),
            MockSettingsStore::new(),
            MockContent::new(),
            settings,
        );

        let state = orchestrator.begin(&plan(DeviceClass::PreCalibrated, true)).unwrap();

        assert_eq!(state, CalibrationState::NetworkCheck);
        assert_eq!(orchestrator.verification().attempt, 1);
    }

    #[tokio::test]
    async fn failed_network_save_keeps_network_check_and_retries() {
        let mut settings_port = MockSettingsStore::new();
        let mut seq = mockall::Sequence::new();
        settings_port
            .expect_save()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        settings_port
            .expect_save()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::new(RecordingView::default()),
            settings_port,
            MockContent::new(),
            Settings::default(),
        );
        orchestrator.begin(&plan(DeviceClass::ManualCalibration, true)).unwrap();
        assert!(orchestrator.set_content_hostname("content.local"));
        orchestrator.tick(OperatorInput::confirm()).unwrap();
        assert_eq!(orchestrator.state(), CalibrationState::NetworkCheck);
        orchestrator
            .subscribe_verification()
            .wait_for(|snapshot| snapshot.state.is_terminal())
            .await
            .unwrap();

        let err = orchestrator.tick(OperatorInput::default()).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(orchestrator.state(), CalibrationState::NetworkCheck);

        let outcome = orchestrator.tick(OperatorInput::default()).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Moved {
                from: CalibrationState::NetworkCheck,
                to: CalibrationState::Initialized,
            }
        );
    }

    #[tokio::test]
    async fn hostname_edits_during_check_do_not_replace_the_verified_one() {
        let mut settings_port = MockSettingsStore::new();
        settings_port
            .expect_save()
            .withf(|settings| settings.network.content_hostname == "good.local")
            .times(1)
            .returning(|_| Ok(()));
        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::new(RecordingView::default()),
            settings_port,
            MockContent::new(),
            Settings::default(),
        );
        orchestrator.begin(&plan(DeviceClass::ManualCalibration, true)).unwrap();
        assert!(orchestrator.set_content_hostname("good.local"));
        orchestrator.tick(OperatorInput::confirm()).unwrap();
        assert_eq!(orchestrator.state(), CalibrationState::NetworkCheck);

        assert!(!orchestrator.set_content_hostname("typo.invalid"));
        orchestrator
            .subscribe_verification()
            .wait_for(|snapshot| snapshot.state.is_terminal())
            .await
            .unwrap();
        orchestrator.tick(OperatorInput::default()).unwrap();

        assert_eq!(orchestrator.state(), CalibrationState::Initialized);
        assert_eq!(orchestrator.settings().network.content_hostname, "good.local");
    }

    #[tokio::test]
    async fn hostname_edits_outside_network_configuration_are_ignored() {
        let mut orchestrator = build(
            Arc::new(RecordingRig::default()),
            Arc::new(RecordingView::default()),
            MockSettingsStore::new(),
            MockContent::new(),
            Settings::default(),
        );
        orchestrator.begin(&plan(DeviceClass::ManualCalibration, false)).unwrap();

        assert!(!orchestrator.set_content_hostname("early.local"));
        assert_eq!(orchestrator.settings().network.content_hostname, "");
    }
}
