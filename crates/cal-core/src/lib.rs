//! # cal-core
//!
//! Core domain models and business logic for Calibrator.
//!
//! This crate contains the calibration state machine, the device capability
//! gate and the port interfaces. It has no infrastructure dependencies.

pub mod calibration;
pub mod config;
pub mod device;
pub mod network;
pub mod ports;
pub mod settings;

// Re-export commonly used types at the crate root
pub use calibration::{
    CalibrationAction, CalibrationEvent, CalibrationState, CalibrationStateMachine, OperatorInput,
};
pub use config::CalibratorConfig;
pub use device::{DeviceCapabilityProfile, DeviceClass};
pub use network::{ConnectionPhase, NetworkVerificationState};
pub use settings::Settings;
