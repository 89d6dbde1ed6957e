pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, resolve_config_path, ConfigError};
pub use run::{run_calibrator, run_session};
pub use wiring::{wire_dependencies, CalibratorDeps, WiringError};
