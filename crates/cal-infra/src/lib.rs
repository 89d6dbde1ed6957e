pub mod content;
pub mod device;
pub mod network;
pub mod settings;

pub use content::DirectoryContentLauncher;
pub use device::{CalibrationMarker, FileDeviceCapabilityProvider};
pub use network::TcpReachabilityLink;
pub use settings::FileSettingsRepository;
