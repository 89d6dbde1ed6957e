use anyhow::Result;

/// Display/camera rig availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigReadiness {
    /// Rig not spawned yet; ticks are no-ops until it is.
    Pending,
    Ready,
    /// The active display is not a supported rig.
    Unsupported { reason: String },
}

/// Camera/display rig the calibration views render through.
pub trait DisplayRigPort: Send + Sync {
    fn readiness(&self) -> RigReadiness;

    /// Persist the current geometric/color calibration.
    fn save_settings(&self) -> Result<()>;

    /// Toggle cross-view blending.
    fn set_blending(&self, enabled: bool);

    /// Toggle software-side geometric compensation.
    fn set_software_compensation(&self, enabled: bool);
}
