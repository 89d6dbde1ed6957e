use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Hostname of the content server. Empty until the operator fills it in.
    #[serde(default)]
    pub content_hostname: String,

    /// Content package launched instead of the calibration flow on a
    /// calibrated device.
    #[serde(default)]
    pub startup_package: Option<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            content_hostname: String::new(),
            startup_package: None,
        }
    }
}

/// Persisted device settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub network: NetworkSettings,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            network: NetworkSettings::default(),
        }
    }
}
