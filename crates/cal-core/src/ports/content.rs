use anyhow::Result;

/// Content package launcher.
pub trait StartupContentPort: Send + Sync {
    /// Launch the named package if it is installed.
    ///
    /// Returns `Ok(false)` when no such package exists.
    fn launch_startup_package(&self, name: &str) -> Result<bool>;
}
