//! Device capability gate.
//!
//! Pure functions deciding whether a device counts as calibrated and whether
//! it may skip the manual geometric steps.

use serde::{Deserialize, Serialize};

/// Installed device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Projection rig that needs full manual geometric calibration.
    ManualCalibration,
    /// Fixed optics shipped calibrated from the factory.
    PreCalibrated,
    /// Class could not be determined.
    Unknown,
}

impl DeviceClass {
    /// Parse a config value. Unrecognised values map to `Unknown`.
    pub fn from_config_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" | "manual_calibration" => DeviceClass::ManualCalibration,
            "pre_calibrated" | "precalibrated" => DeviceClass::PreCalibrated,
            _ => DeviceClass::Unknown,
        }
    }
}

/// Per-run device capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilityProfile {
    pub class: DeviceClass,
    pub has_persisted_calibration: bool,
}

/// Whether the device may skip physical alignment, corner alignment, lens
/// shift and color correction.
pub fn auto_skip_manual_steps(class: DeviceClass) -> bool {
    class == DeviceClass::PreCalibrated
}

/// Calibration status before any override is applied.
fn baseline_calibrated(class: DeviceClass, has_persisted_calibration: bool) -> bool {
    match class {
        DeviceClass::ManualCalibration => has_persisted_calibration,
        DeviceClass::PreCalibrated | DeviceClass::Unknown => true,
    }
}

/// Whether the operator should get a grace window to force recalibration.
///
/// Only offered when the device would otherwise start calibrated.
pub fn offers_grace_period(
    class: DeviceClass,
    force_recalibrate: bool,
    has_persisted_calibration: bool,
) -> bool {
    !force_recalibrate && baseline_calibrated(class, has_persisted_calibration)
}

/// Decide whether the device counts as calibrated at startup.
pub fn is_calibrated(
    class: DeviceClass,
    force_recalibrate: bool,
    has_persisted_calibration: bool,
    operator_aborted_grace_period: bool,
) -> bool {
    if force_recalibrate || operator_aborted_grace_period {
        return false;
    }
    baseline_calibrated(class, has_persisted_calibration)
}
