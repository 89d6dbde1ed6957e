//! Device capability domain.

mod capability;

pub use capability::{
    auto_skip_manual_steps, is_calibrated, offers_grace_period, DeviceCapabilityProfile,
    DeviceClass,
};
