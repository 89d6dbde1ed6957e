//! # cal-runtime
//!
//! Headless runtime for Calibrator: configuration loading, tracing setup,
//! dependency wiring, console/stdin adapters and the tick loop.

pub mod adapters;
pub mod bootstrap;
