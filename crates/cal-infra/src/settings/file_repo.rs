use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use cal_core::ports::SettingsPort;
use cal_core::settings::{Settings, CURRENT_SCHEMA_VERSION};

/// JSON settings file, written atomically.
pub struct FileSettingsRepository {
    path: PathBuf,
}

impl FileSettingsRepository {
    /// Creates a repository backed by the settings file at `path`.
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create settings dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes `content` to a temp file next to the target and renames it
    /// over the target, so readers see either the old or the new file.
    fn atomic_write(&self, content: &str) -> Result<()> {
        self.ensure_parent_dir()?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("write temp settings failed: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "rename temp settings to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

impl SettingsPort for FileSettingsRepository {
    /// Loads settings, falling back to defaults when the file is missing or
    /// empty.
    fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file missing, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read settings failed: {}", self.path.display()))
            }
        };

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let mut settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("parse settings failed: {}", self.path.display()))?;

        if settings.schema_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "settings schema version {} is newer than supported version {}",
                settings.schema_version,
                CURRENT_SCHEMA_VERSION
            );
        }
        if settings.schema_version < CURRENT_SCHEMA_VERSION {
            // Older files only lack fields that serde already defaulted.
            warn!(
                from = settings.schema_version,
                to = CURRENT_SCHEMA_VERSION,
                "upgrading settings schema"
            );
            settings.schema_version = CURRENT_SCHEMA_VERSION;
            self.save(&settings)?;
        }

        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let content =
            serde_json::to_string_pretty(settings).context("serialize settings failed")?;

        self.atomic_write(&content)
    }
}
