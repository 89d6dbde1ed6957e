//! Headless adapters for the calibration ports.

pub mod audio;
pub mod console;
pub mod display_rig;
pub mod operator;

pub use audio::TimedAudioSelfTest;
pub use console::{ConsoleCalibrationView, ConsoleNetworkIndicators};
pub use display_rig::HeadlessDisplayRig;
pub use operator::{OperatorBatch, OperatorCommand, OperatorFeed, OperatorOverrideSwitch, OperatorQueue};
