//! Calibration use cases.
//!
//! This module exposes the calibration orchestrator, the startup resolver and
//! the network verification coordinator.

pub mod orchestrator;
pub mod startup;
pub mod verification;

pub use orchestrator::{CalibrationOrchestrator, CalibrationPorts, OrchestratorError, TickOutcome};
pub use startup::{StartupPlan, StartupResolver};
pub use verification::VerificationCoordinator;
