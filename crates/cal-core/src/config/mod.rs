//! Configuration data module.
//!
//! Maps the TOML configuration file onto plain data. Loading the file is the
//! runtime's job; this module only knows the shape.

mod app_config;

pub use app_config::{
    CalibratorConfig, PathsConfig, VerificationConfig, DEFAULT_GRACE_PERIOD,
    DEFAULT_POLL_INTERVAL,
};
