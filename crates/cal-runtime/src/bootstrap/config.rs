//! # Configuration Loader
//!
//! Reads the TOML configuration file and maps it onto [`CalibratorConfig`].
//! Value defaults live in `cal-core`; this module only does I/O and parsing.

use std::path::{Path, PathBuf};

use cal_core::config::CalibratorConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CALIBRATOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "calibrator.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path} as TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Config path from `CALIBRATOR_CONFIG`, else `calibrator.toml` in the
/// working directory.
pub fn resolve_config_path() -> PathBuf {
    config_path_from(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

fn config_path_from(env_value: Option<PathBuf>) -> PathBuf {
    env_value
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a TOML file.
///
/// A missing file yields the default configuration. Unreadable, malformed
/// or mistyped files are errors.
pub fn load_config(config_path: &Path) -> Result<CalibratorConfig, ConfigError> {
    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CalibratorConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })
        }
    };

    let toml_value: toml::Value = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })?;

    CalibratorConfig::from_toml(&toml_value).map_err(|source| ConfigError::Invalid {
        path: config_path.to_path_buf(),
        source,
    })
}
