use std::path::PathBuf;
use std::time::Duration;

use crate::device::DeviceClass;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);
const DEFAULT_AUDIO_TEST_DURATION: Duration = Duration::from_secs(3);
const DEFAULT_CONTENT_PORT: u16 = 3917;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Verification coordinator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    /// Delay between two connection phase polls.
    pub poll_interval: Duration,
    /// Resolve `Rejected` once this elapses. `None` polls forever.
    pub timeout: Option<Duration>,
    /// Content server port used by the reachability link.
    pub port: u16,
    /// Bound on a single TCP connect.
    pub connect_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            port: DEFAULT_CONTENT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// File locations (path info only, no existence check).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub settings_file: PathBuf,
    /// Persisted display calibration; its presence marks a calibrated rig.
    pub calibration_file: PathBuf,
    pub packages_dir: PathBuf,
    /// Directory for the rolling log file. `None` logs to stdout only.
    pub logs_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from("settings.json"),
            calibration_file: PathBuf::from("calibration.json"),
            packages_dir: PathBuf::from("packages"),
            logs_dir: None,
        }
    }
}

/// Calibrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibratorConfig {
    pub device_class: DeviceClass,
    /// Always run the full calibration flow.
    pub force_recalibrate: bool,
    /// How long the operator has to hold the override after startup.
    pub startup_grace_period: Duration,
    pub tick_interval: Duration,
    /// Duration of the headless audio self-test.
    pub audio_test_duration: Duration,
    pub verification: VerificationConfig,
    pub paths: PathsConfig,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            device_class: DeviceClass::ManualCalibration,
            force_recalibrate: false,
            startup_grace_period: DEFAULT_GRACE_PERIOD,
            tick_interval: DEFAULT_TICK_INTERVAL,
            audio_test_duration: DEFAULT_AUDIO_TEST_DURATION,
            verification: VerificationConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl CalibratorConfig {
    /// Create the config from a parsed TOML value.
    ///
    /// Missing keys take the defaults above; keys with the wrong type are
    /// reported as errors.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let device_class = match str_at(toml_value, "device", "class")? {
            Some(value) => DeviceClass::from_config_value(value),
            None => defaults.device_class,
        };

        let timeout = millis_at(toml_value, "verification", "timeout_ms")?.filter(|d| !d.is_zero());

        Ok(Self {
            device_class,
            force_recalibrate: bool_at(toml_value, "device", "force_recalibrate")?
                .unwrap_or(defaults.force_recalibrate),
            startup_grace_period: millis_at(toml_value, "startup", "grace_period_ms")?
                .unwrap_or(defaults.startup_grace_period),
            tick_interval: nonzero_millis_at(toml_value, "runtime", "tick_interval_ms")?
                .unwrap_or(defaults.tick_interval),
            audio_test_duration: millis_at(toml_value, "runtime", "audio_test_ms")?
                .unwrap_or(defaults.audio_test_duration),
            verification: VerificationConfig {
                poll_interval: nonzero_millis_at(toml_value, "verification", "poll_interval_ms")?
                    .unwrap_or(defaults.verification.poll_interval),
                timeout,
                port: match int_at(toml_value, "verification", "port")? {
                    Some(port) => u16::try_from(port)
                        .map_err(|_| anyhow::anyhow!("verification.port out of range: {port}"))?,
                    None => defaults.verification.port,
                },
                connect_timeout: nonzero_millis_at(toml_value, "verification", "connect_timeout_ms")?
                    .unwrap_or(defaults.verification.connect_timeout),
            },
            paths: PathsConfig {
                settings_file: str_at(toml_value, "paths", "settings_file")?
                    .map(PathBuf::from)
                    .unwrap_or(defaults.paths.settings_file),
                calibration_file: str_at(toml_value, "paths", "calibration_file")?
                    .map(PathBuf::from)
                    .unwrap_or(defaults.paths.calibration_file),
                packages_dir: str_at(toml_value, "paths", "packages_dir")?
                    .map(PathBuf::from)
                    .unwrap_or(defaults.paths.packages_dir),
                logs_dir: str_at(toml_value, "paths", "logs_dir")?.map(PathBuf::from),
            },
        })
    }
}

fn value_at<'a>(root: &'a toml::Value, section: &str, key: &str) -> Option<&'a toml::Value> {
    root.get(section).and_then(|s| s.get(key))
}

fn str_at<'a>(root: &'a toml::Value, section: &str, key: &str) -> anyhow::Result<Option<&'a str>> {
    match value_at(root, section, key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("{section}.{key} must be a string")),
    }
}

fn bool_at(root: &toml::Value, section: &str, key: &str) -> anyhow::Result<Option<bool>> {
    match value_at(root, section, key) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("{section}.{key} must be a boolean")),
    }
}

fn int_at(root: &toml::Value, section: &str, key: &str) -> anyhow::Result<Option<i64>> {
    match value_at(root, section, key) {
        None => Ok(None),
        Some(v) => v
            .as_integer()
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("{section}.{key} must be an integer")),
    }
}

fn millis_at(root: &toml::Value, section: &str, key: &str) -> anyhow::Result<Option<Duration>> {
    match int_at(root, section, key)? {
        None => Ok(None),
        Some(ms) if ms < 0 => Err(anyhow::anyhow!("{section}.{key} must not be negative")),
        Some(ms) => Ok(Some(Duration::from_millis(ms as u64))),
    }
}

/// Like [`millis_at`], for periods that drive a timer loop.
fn nonzero_millis_at(
    root: &toml::Value,
    section: &str,
    key: &str,
) -> anyhow::Result<Option<Duration>> {
    match millis_at(root, section, key)? {
        Some(d) if d.is_zero() => Err(anyhow::anyhow!("{section}.{key} must be greater than zero")),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    #[test]
    fn empty_document_yields_defaults() {
        let toml_value: Value = toml::from_str("").unwrap();
        let config = CalibratorConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config, CalibratorConfig::default());
        assert_eq!(config.verification.poll_interval, Duration::from_millis(500));
        assert_eq!(config.verification.timeout, None);
    }

    #[test]
    fn parses_all_sections() {
        let toml_str = r#"
            [device]
            class = "pre_calibrated"
            force_recalibrate = true

            [startup]
            grace_period_ms = 1000

            [verification]
            poll_interval_ms = 250
            timeout_ms = 30000
            port = 8080

            [paths]
            settings_file = "/var/lib/calibrator/settings.json"
            logs_dir = "/var/log/calibrator"
        "#;
        let toml_value: Value = toml::from_str(toml_str).unwrap();

        let config = CalibratorConfig::from_toml(&toml_value).unwrap();

        assert_eq!(config.device_class, DeviceClass::PreCalibrated);
        assert!(config.force_recalibrate);
        assert_eq!(config.startup_grace_period, Duration::from_secs(1));
        assert_eq!(config.verification.poll_interval, Duration::from_millis(250));
        assert_eq!(config.verification.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.verification.port, 8080);
        assert_eq!(
            config.paths.settings_file,
            PathBuf::from("/var/lib/calibrator/settings.json")
        );
        assert_eq!(config.paths.logs_dir, Some(PathBuf::from("/var/log/calibrator")));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let toml_value: Value = toml::from_str("[verification]\ntimeout_ms = 0").unwrap();
        let config = CalibratorConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config.verification.timeout, None);
    }

    #[test]
    fn wrong_types_are_reported() {
        let toml_value: Value = toml::from_str("[device]\nforce_recalibrate = \"yes\"").unwrap();
        let err = CalibratorConfig::from_toml(&toml_value).unwrap_err();
        assert!(err.to_string().contains("device.force_recalibrate"));

        let toml_value: Value = toml::from_str("[verification]\nport = 99999").unwrap();
        assert!(CalibratorConfig::from_toml(&toml_value).is_err());
    }

    #[test]
    fn zero_periods_are_rejected() {
        for (doc, key) in [
            ("[runtime]\ntick_interval_ms = 0", "runtime.tick_interval_ms"),
            ("[verification]\npoll_interval_ms = 0", "verification.poll_interval_ms"),
            ("[verification]\nconnect_timeout_ms = 0", "verification.connect_timeout_ms"),
        ] {
            let toml_value: Value = toml::from_str(doc).unwrap();
            let err = CalibratorConfig::from_toml(&toml_value).unwrap_err();
            assert!(err.to_string().contains(key), "{doc}: {err}");
        }

        let toml_value: Value = toml::from_str("[runtime]\ntick_interval_ms = 1").unwrap();
        let config = CalibratorConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(1));
    }
}
