//! Persisted physical calibration marker.
//!
//! The display rig records a finished geometric calibration by writing this
//! file; the capability provider only checks that it exists.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub saved_at: DateTime<Utc>,
    pub blending: bool,
}

#[derive(Debug, Clone)]
pub struct CalibrationMarker {
    path: PathBuf,
}

impl CalibrationMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the marker, replacing any previous one.
    pub fn record(&self, blending: bool) -> Result<CalibrationRecord> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create calibration dir failed: {}", dir.display()))?;
        }

        let record = CalibrationRecord {
            saved_at: Utc::now(),
            blending,
        };
        let content =
            serde_json::to_string_pretty(&record).context("serialize calibration record failed")?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("write temp calibration failed: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "rename temp calibration failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(record)
    }

    pub fn read(&self) -> Result<Option<CalibrationRecord>> {
        if !self.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("read calibration failed: {}", self.path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("parse calibration failed: {}", self.path.display()))?;
        Ok(Some(record))
    }
}
