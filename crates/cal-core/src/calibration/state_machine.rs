//! Calibration state machine.
//!
//! Pure functions only: deciding which event a tick produces and mapping
//! `(state, event)` to the next state plus the side effects the orchestrator
//! has to run before it commits that state.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationState;
use crate::network::NetworkVerificationState;

/// Operator gestures captured during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorInput {
    /// Confirm key pressed this tick.
    pub confirm: bool,
    /// Step-back gesture (modifier held + back key).
    pub step_back: bool,
    /// Re-run the network phase from `Initialized`.
    pub reset_network: bool,
}

impl OperatorInput {
    pub fn confirm() -> Self {
        Self {
            confirm: true,
            ..Self::default()
        }
    }

    pub fn step_back() -> Self {
        Self {
            step_back: true,
            ..Self::default()
        }
    }

    pub fn reset_network() -> Self {
        Self {
            reset_network: true,
            ..Self::default()
        }
    }

    /// Merge gestures collected from several input sources.
    pub fn merge(self, other: OperatorInput) -> Self {
        Self {
            confirm: self.confirm || other.confirm,
            step_back: self.step_back || other.step_back,
            reset_network: self.reset_network || other.reset_network,
        }
    }
}

/// Everything a tick looks at before it picks an event.
#[derive(Debug, Clone, Copy)]
pub struct TickFacts<'a> {
    pub input: OperatorInput,
    /// Device class skips the manual geometric steps.
    pub auto_skip: bool,
    /// The audio self-test reported completion.
    pub audio_finished: bool,
    /// Content hostname as currently configured.
    pub hostname: &'a str,
    /// Latest outcome of the current verification attempt.
    pub verification: NetworkVerificationState,
}

/// Events that drive the calibration flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationEvent {
    /// Operator confirmed the current step.
    Confirm,
    /// Device class does not need the current manual step.
    AutoSkip,
    /// Audio self-test finished.
    AudioTestFinished,
    /// Operator confirmed the network form.
    SubmitNetworkConfiguration { hostname: String },
    /// Verification attempt reached a terminal outcome.
    VerificationResolved { outcome: NetworkVerificationState },
    /// Operator stepped back one state.
    StepBack,
    /// Operator asked to redo the network phase after initialization.
    ResetNetwork,
}

/// Side effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationAction {
    /// Turn off cross-view blending.
    DisableBlending,
    /// Turn cross-view blending back on.
    EnableBlending,
    /// Fire-and-forget audio self-test.
    StartAudioTest,
    /// Persist camera/display calibration.
    SaveDisplaySettings,
    /// Hide both the connectivity warning and the denied indicator.
    ClearNetworkIndicators,
    /// Start (and supersede) a verification attempt.
    StartVerification { hostname: String },
    ShowConnectivityWarning,
    ShowAuthorizationDenied,
    /// Persist network settings.
    SaveNetworkSettings,
    EnableSoftwareCompensation,
    DisableSoftwareCompensation,
}

/// Pure calibration state machine.
pub struct CalibrationStateMachine;

impl CalibrationStateMachine {
    /// Initial state and actions once startup has decided.
    ///
    /// `content_launched` means a startup package already took over the
    /// display; the calibration flow then stays `Uninitialized`.
    pub fn begin(
        calibrated: bool,
        content_launched: bool,
        hostname: &str,
    ) -> (CalibrationState, Vec<CalibrationAction>) {
        if !calibrated {
            return (
                CalibrationState::PhysicalAlignment,
                vec![CalibrationAction::EnableSoftwareCompensation],
            );
        }
        if content_launched {
            return (
                CalibrationState::Uninitialized,
                vec![CalibrationAction::DisableSoftwareCompensation],
            );
        }
        if is_blank(hostname) {
            return (
                CalibrationState::NetworkConfiguration,
                vec![CalibrationAction::DisableSoftwareCompensation],
            );
        }
        (
            CalibrationState::NetworkCheck,
            vec![
                CalibrationAction::DisableSoftwareCompensation,
                CalibrationAction::StartVerification {
                    hostname: hostname.to_string(),
                },
            ],
        )
    }

    /// Pick at most one event for this tick.
    ///
    /// Navigation gestures win over the state's forward rule.
    pub fn select_event(state: CalibrationState, facts: &TickFacts<'_>) -> Option<CalibrationEvent> {
        if facts.input.step_back && state.allows_step_back() {
            return Some(CalibrationEvent::StepBack);
        }
        if facts.input.reset_network && state == CalibrationState::Initialized {
            return Some(CalibrationEvent::ResetNetwork);
        }

        match state {
            s if s.is_manual_step() => {
                if facts.input.confirm {
                    Some(CalibrationEvent::Confirm)
                } else if facts.auto_skip {
                    Some(CalibrationEvent::AutoSkip)
                } else {
                    None
                }
            }
            CalibrationState::Audio if facts.audio_finished => {
                Some(CalibrationEvent::AudioTestFinished)
            }
            CalibrationState::NetworkConfiguration if facts.input.confirm => {
                Some(CalibrationEvent::SubmitNetworkConfiguration {
                    hostname: facts.hostname.to_string(),
                })
            }
            CalibrationState::NetworkCheck if facts.verification.is_terminal() => {
                Some(CalibrationEvent::VerificationResolved {
                    outcome: facts.verification,
                })
            }
            _ => None,
        }
    }

    pub fn transition(
        state: CalibrationState,
        event: CalibrationEvent,
    ) -> (CalibrationState, Vec<CalibrationAction>) {
        use CalibrationAction as A;
        use CalibrationEvent as E;
        use CalibrationState as S;

        match (state, event) {
            (S::PhysicalAlignment, E::Confirm | E::AutoSkip) => {
                (S::CornerAlignment, entry_actions(S::CornerAlignment))
            }
            // Blending only comes back once the operator has actually seen
            // the corner view; the auto-skip path leaves it off.
            (S::CornerAlignment, E::Confirm) => (S::LensShift, vec![A::EnableBlending]),
            (S::CornerAlignment, E::AutoSkip) => (S::LensShift, Vec::new()),
            (S::LensShift, E::Confirm | E::AutoSkip) => (
                S::ColorCorrection,
                vec![A::SaveDisplaySettings, A::StartAudioTest],
            ),
            (S::ColorCorrection, E::Confirm | E::AutoSkip) => (S::Audio, Vec::new()),
            (S::Audio, E::AudioTestFinished) => (S::NetworkConfiguration, Vec::new()),
            (S::NetworkConfiguration, E::SubmitNetworkConfiguration { hostname }) => {
                if is_blank(&hostname) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("network configuration confirmed without hostname, ignoring");
                    return (S::NetworkConfiguration, Vec::new());
                }
                (
                    S::NetworkCheck,
                    vec![
                        A::ClearNetworkIndicators,
                        A::StartVerification { hostname },
                    ],
                )
            }
            (S::NetworkCheck, E::VerificationResolved { outcome }) => match outcome {
                NetworkVerificationState::Rejected => {
                    (S::NetworkConfiguration, vec![A::ShowConnectivityWarning])
                }
                NetworkVerificationState::Denied => {
                    (S::NetworkConfiguration, vec![A::ShowAuthorizationDenied])
                }
                NetworkVerificationState::Succeeded => (
                    S::Initialized,
                    vec![A::SaveNetworkSettings, A::DisableSoftwareCompensation],
                ),
                NetworkVerificationState::Pending => (S::NetworkCheck, Vec::new()),
            },
            (s, E::StepBack) if s.allows_step_back() => match s.previous() {
                Some(prev) => (prev, entry_actions(prev)),
                None => (s, Vec::new()),
            },
            (S::Initialized, E::ResetNetwork) => (S::NetworkConfiguration, Vec::new()),
            (state, _event) => (state, Vec::new()),
        }
    }

    /// Actions repeated on every tick spent in `state` without a transition.
    pub fn steady_actions(state: CalibrationState) -> Vec<CalibrationAction> {
        match state {
            CalibrationState::Initialized => vec![CalibrationAction::DisableSoftwareCompensation],
            _ => Vec::new(),
        }
    }
}

fn entry_actions(state: CalibrationState) -> Vec<CalibrationAction> {
    match state {
        CalibrationState::CornerAlignment => vec![CalibrationAction::DisableBlending],
        _ => Vec::new(),
    }
}

fn is_blank(hostname: &str) -> bool {
    hostname.trim().is_empty()
}
