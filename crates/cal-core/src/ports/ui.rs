use crate::calibration::CalibrationState;

/// Calibration view synchronization.
pub trait CalibrationViewPort: Send + Sync {
    /// Activate the view for `to` and deactivate every other view.
    ///
    /// Only called on an actual state change, but must tolerate `from == to`.
    fn on_state_changed(&self, from: CalibrationState, to: CalibrationState);
}

/// Network step indicators.
pub trait NetworkIndicatorPort: Send + Sync {
    fn set_connectivity_warning(&self, visible: bool);
    fn set_authorization_denied(&self, visible: bool);
}
