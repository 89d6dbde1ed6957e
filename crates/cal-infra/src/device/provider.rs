use tracing::debug;

use cal_core::device::DeviceClass;
use cal_core::ports::DeviceCapabilityPort;

use super::CalibrationMarker;

/// Capability provider backed by configuration and the calibration marker.
///
/// The device class comes from configuration; a persisted calibration is
/// whatever the marker file says at the time of the call.
pub struct FileDeviceCapabilityProvider {
    class: DeviceClass,
    marker: CalibrationMarker,
}

impl FileDeviceCapabilityProvider {
    pub fn new(class: DeviceClass, marker: CalibrationMarker) -> Self {
        Self { class, marker }
    }
}

impl DeviceCapabilityPort for FileDeviceCapabilityProvider {
    fn device_class(&self) -> DeviceClass {
        self.class
    }

    fn has_persisted_calibration(&self) -> bool {
        let exists = self.marker.exists();
        debug!(path = %self.marker.path().display(), exists, "checked calibration marker");
        exists
    }
}
