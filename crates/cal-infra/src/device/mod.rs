//! Device capability adapters.

mod marker;
mod provider;

pub use marker::{CalibrationMarker, CalibrationRecord};
pub use provider::FileDeviceCapabilityProvider;
