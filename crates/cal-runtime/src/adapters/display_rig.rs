use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tokio::time::Instant;
use tracing::{debug, info};

use cal_core::ports::{DisplayRigPort, RigReadiness};
use cal_infra::CalibrationMarker;

/// Display rig without real hardware.
///
/// Reports `Pending` until `ready_at`, then `Ready`. Saving writes the
/// calibration marker the capability provider looks for on the next start.
pub struct HeadlessDisplayRig {
    marker: CalibrationMarker,
    ready_at: Instant,
    blending: AtomicBool,
    software_compensation: AtomicBool,
}

impl HeadlessDisplayRig {
    pub fn new(marker: CalibrationMarker) -> Self {
        Self::ready_at(marker, Instant::now())
    }

    pub fn ready_at(marker: CalibrationMarker, ready_at: Instant) -> Self {
        Self {
            marker,
            ready_at,
            blending: AtomicBool::new(true),
            software_compensation: AtomicBool::new(false),
        }
    }

    pub fn blending(&self) -> bool {
        self.blending.load(Ordering::SeqCst)
    }

    pub fn software_compensation(&self) -> bool {
        self.software_compensation.load(Ordering::SeqCst)
    }
}

impl DisplayRigPort for HeadlessDisplayRig {
    fn readiness(&self) -> RigReadiness {
        if Instant::now() < self.ready_at {
            RigReadiness::Pending
        } else {
            RigReadiness::Ready
        }
    }

    fn save_settings(&self) -> anyhow::Result<()> {
        let record = self
            .marker
            .record(self.blending())
            .context("save display calibration failed")?;
        info!(
            path = %self.marker.path().display(),
            saved_at = %record.saved_at,
            "display calibration saved"
        );
        Ok(())
    }

    fn set_blending(&self, enabled: bool) {
        if self.blending.swap(enabled, Ordering::SeqCst) != enabled {
            debug!(enabled, "blending changed");
        }
    }

    fn set_software_compensation(&self, enabled: bool) {
        if self.software_compensation.swap(enabled, Ordering::SeqCst) != enabled {
            debug!(enabled, "software compensation changed");
        }
    }
}
