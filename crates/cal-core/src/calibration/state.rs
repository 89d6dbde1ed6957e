use serde::{Deserialize, Serialize};

/// Calibration flow state.
///
/// The variants are declared in flow order, so the derived `Ord` matches the
/// commissioning sequence. Moving between states goes through [`next`] and
/// [`previous`]; the two non-adjacent jumps live in the state machine.
///
/// [`next`]: CalibrationState::next
/// [`previous`]: CalibrationState::previous
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    /// Startup has not decided anything yet, or a startup package took over.
    Uninitialized,
    /// Operator aligns the physical device.
    PhysicalAlignment,
    /// Operator drags projection corners into place.
    CornerAlignment,
    /// Operator adjusts the lens shift.
    LensShift,
    /// Operator tunes per-view color.
    ColorCorrection,
    /// Audio self-test is running.
    Audio,
    /// Operator enters the content hostname.
    NetworkConfiguration,
    /// Verification attempt in flight.
    NetworkCheck,
    /// Commissioning finished.
    Initialized,
}

impl CalibrationState {
    /// Every state in flow order.
    pub const ALL: [CalibrationState; 9] = [
        CalibrationState::Uninitialized,
        CalibrationState::PhysicalAlignment,
        CalibrationState::CornerAlignment,
        CalibrationState::LensShift,
        CalibrationState::ColorCorrection,
        CalibrationState::Audio,
        CalibrationState::NetworkConfiguration,
        CalibrationState::NetworkCheck,
        CalibrationState::Initialized,
    ];

    /// Immediate successor, `None` for `Initialized`.
    pub fn next(self) -> Option<CalibrationState> {
        use CalibrationState::*;
        match self {
            Uninitialized => Some(PhysicalAlignment),
            PhysicalAlignment => Some(CornerAlignment),
            CornerAlignment => Some(LensShift),
            LensShift => Some(ColorCorrection),
            ColorCorrection => Some(Audio),
            Audio => Some(NetworkConfiguration),
            NetworkConfiguration => Some(NetworkCheck),
            NetworkCheck => Some(Initialized),
            Initialized => None,
        }
    }

    /// Immediate predecessor, `None` for `Uninitialized`.
    pub fn previous(self) -> Option<CalibrationState> {
        use CalibrationState::*;
        match self {
            Uninitialized => None,
            PhysicalAlignment => Some(Uninitialized),
            CornerAlignment => Some(PhysicalAlignment),
            LensShift => Some(CornerAlignment),
            ColorCorrection => Some(LensShift),
            Audio => Some(ColorCorrection),
            NetworkConfiguration => Some(Audio),
            NetworkCheck => Some(NetworkConfiguration),
            Initialized => Some(NetworkCheck),
        }
    }

    /// Steps an operator walks through by hand unless the device class skips them.
    pub fn is_manual_step(self) -> bool {
        matches!(
            self,
            CalibrationState::PhysicalAlignment
                | CalibrationState::CornerAlignment
                | CalibrationState::LensShift
                | CalibrationState::ColorCorrection
        )
    }

    /// Whether the step-back gesture applies in this state.
    ///
    /// Disabled at `PhysicalAlignment` (nothing meaningful before it) and from
    /// `NetworkCheck` on, since leaving an in-flight check would orphan the
    /// verification attempt.
    pub fn allows_step_back(self) -> bool {
        self > CalibrationState::PhysicalAlignment
            && self <= CalibrationState::NetworkConfiguration
    }
}

impl std::fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
