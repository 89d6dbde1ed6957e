//! # cal-app
//!
//! Application layer: drives the calibration state machine against the
//! ports defined in `cal-core`.

pub mod usecases;

pub use usecases::calibration::{
    CalibrationOrchestrator, CalibrationPorts, OrchestratorError, StartupPlan, StartupResolver,
    TickOutcome, VerificationCoordinator,
};
