pub mod calibration;

pub use calibration::{
    CalibrationOrchestrator, CalibrationPorts, OrchestratorError, StartupPlan, StartupResolver,
    TickOutcome, VerificationCoordinator,
};
