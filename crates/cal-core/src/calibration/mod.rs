//! Calibration domain module.
//!
//! This module defines the commissioning flow states and the pure state
//! machine that sequences them.

mod state;
pub mod state_machine;

pub use state::CalibrationState;
pub use state_machine::{
    CalibrationAction, CalibrationEvent, CalibrationStateMachine, OperatorInput, TickFacts,
};
