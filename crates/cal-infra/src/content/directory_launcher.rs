use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use tracing::info;

use cal_core::ports::StartupContentPort;

/// Startup packages are directories under a packages root.
///
/// Launching only resolves the package; handing the display over to it is
/// the content player's job.
pub struct DirectoryContentLauncher {
    packages_dir: PathBuf,
}

impl DirectoryContentLauncher {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name.trim());
        let is_plain_name = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain_name || relative.as_os_str().is_empty() {
            anyhow::bail!("invalid startup package name: {name:?}");
        }
        Ok(self.packages_dir.join(relative))
    }
}

impl StartupContentPort for DirectoryContentLauncher {
    fn launch_startup_package(&self, name: &str) -> Result<bool> {
        let package_dir = self.resolve(name)?;
        if !package_dir.is_dir() {
            return Ok(false);
        }
        info!(package = %name, path = %package_dir.display(), "handing display to startup package");
        Ok(true)
    }
}
