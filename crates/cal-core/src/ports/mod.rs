//! Port interfaces for the application layer
//!
//! Ports define the contract between the calibration orchestrator and the
//! collaborators it drives or observes. Ports consulted from the tick loop
//! are synchronous and must return promptly; the network link is async
//! because it is only ever driven from the verification worker.

pub mod audio;
pub mod content;
pub mod device_capability;
pub mod display_rig;
pub mod network_link;
pub mod operator;
pub mod settings;
pub mod ui;

pub use audio::{AudioSelfTestPort, AudioTestHandle};
pub use content::StartupContentPort;
pub use device_capability::DeviceCapabilityPort;
pub use display_rig::{DisplayRigPort, RigReadiness};
pub use network_link::NetworkLinkPort;
pub use operator::OperatorOverridePort;
pub use settings::SettingsPort;
pub use ui::{CalibrationViewPort, NetworkIndicatorPort};
