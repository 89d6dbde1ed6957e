use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use cal_core::ports::{CalibrationViewPort, NetworkIndicatorPort};
use cal_core::CalibrationState;

/// Operator prompt shown when `state` becomes active.
pub fn prompt_for(state: CalibrationState) -> &'static str {
    match state {
        CalibrationState::Uninitialized => "startup content is running",
        CalibrationState::PhysicalAlignment => {
            "align the device physically, then press Enter"
        }
        CalibrationState::CornerAlignment => "drag the projection corners into place, then press Enter",
        CalibrationState::LensShift => "adjust the lens shift, then press Enter",
        CalibrationState::ColorCorrection => "tune per-view color, then press Enter",
        CalibrationState::Audio => "audio self-test running, please wait",
        CalibrationState::NetworkConfiguration => {
            "type `host <name>` for the content server, then press Enter"
        }
        CalibrationState::NetworkCheck => "verifying the content server",
        CalibrationState::Initialized => "calibration complete (`reset` re-runs the network setup)",
    }
}

/// Logs each view activation together with its operator prompt.
#[derive(Default)]
pub struct ConsoleCalibrationView;

impl CalibrationViewPort for ConsoleCalibrationView {
    fn on_state_changed(&self, from: CalibrationState, to: CalibrationState) {
        info!(%from, %to, prompt = prompt_for(to), "calibration view activated");
    }
}

/// Console network indicators. Only visibility changes are logged.
#[derive(Default)]
pub struct ConsoleNetworkIndicators {
    connectivity_warning: AtomicBool,
    authorization_denied: AtomicBool,
}

impl ConsoleNetworkIndicators {
    pub fn connectivity_warning(&self) -> bool {
        self.connectivity_warning.load(Ordering::SeqCst)
    }

    pub fn authorization_denied(&self) -> bool {
        self.authorization_denied.load(Ordering::SeqCst)
    }
}

impl NetworkIndicatorPort for ConsoleNetworkIndicators {
    fn set_connectivity_warning(&self, visible: bool) {
        if self.connectivity_warning.swap(visible, Ordering::SeqCst) != visible {
            if visible {
                warn!("content server unreachable, check the hostname and network");
            } else {
                info!("connectivity warning cleared");
            }
        }
    }

    fn set_authorization_denied(&self, visible: bool) {
        if self.authorization_denied.swap(visible, Ordering::SeqCst) != visible {
            if visible {
                warn!("content server refused this device");
            } else {
                info!("authorization indicator cleared");
            }
        }
    }
}
