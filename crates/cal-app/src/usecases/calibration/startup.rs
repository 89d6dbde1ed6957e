//! Startup calibration decision.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, Instrument};

use cal_core::device::{self, DeviceCapabilityProfile};
use cal_core::ports::{DeviceCapabilityPort, OperatorOverridePort};

/// What startup decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPlan {
    pub profile: DeviceCapabilityProfile,
    /// Skip the manual flow and go straight to the network phase.
    pub calibrated: bool,
    /// Operator held the override during the grace window.
    pub operator_override: bool,
}

/// Decides at startup whether the device is already calibrated.
pub struct StartupResolver {
    capability: Arc<dyn DeviceCapabilityPort>,
    operator: Arc<dyn OperatorOverridePort>,
    force_recalibrate: bool,
    grace_period: Duration,
}

impl StartupResolver {
    pub fn new(
        capability: Arc<dyn DeviceCapabilityPort>,
        operator: Arc<dyn OperatorOverridePort>,
        force_recalibrate: bool,
        grace_period: Duration,
    ) -> Self {
        Self {
            capability,
            operator,
            force_recalibrate,
            grace_period,
        }
    }

    /// Resolve the startup plan.
    ///
    /// When the device would start calibrated, waits the grace period and
    /// then samples the operator override once.
    pub async fn resolve(&self) -> StartupPlan {
        let span = info_span!("usecase.calibration.startup");
        async {
            let profile = self.capability.profile();

            let mut operator_override = false;
            if device::offers_grace_period(
                profile.class,
                self.force_recalibrate,
                profile.has_persisted_calibration,
            ) {
                info!(
                    grace_ms = self.grace_period.as_millis() as u64,
                    "device looks calibrated, waiting for operator override"
                );
                tokio::time::sleep(self.grace_period).await;
                operator_override = self.operator.is_override_held();
            }

            let calibrated = device::is_calibrated(
                profile.class,
                self.force_recalibrate,
                profile.has_persisted_calibration,
                operator_override,
            );
            info!(
                class = ?profile.class,
                has_persisted_calibration = profile.has_persisted_calibration,
                force_recalibrate = self.force_recalibrate,
                operator_override,
                calibrated,
                "startup calibration decided"
            );

            StartupPlan {
                profile,
                calibrated,
                operator_override,
            }
        }
        .instrument(span)
        .await
    }
}
