use crate::device::{DeviceCapabilityProfile, DeviceClass};

/// Reports what kind of device is installed.
pub trait DeviceCapabilityPort: Send + Sync {
    fn device_class(&self) -> DeviceClass;

    /// Whether a previous physical calibration is stored on disk.
    fn has_persisted_calibration(&self) -> bool;

    fn profile(&self) -> DeviceCapabilityProfile {
        DeviceCapabilityProfile {
            class: self.device_class(),
            has_persisted_calibration: self.has_persisted_calibration(),
        }
    }
}
