use crate::settings::Settings;

/// Settings store.
///
/// Only ever called from the tick loop, never from the verification worker.
pub trait SettingsPort: Send + Sync {
    fn load(&self) -> anyhow::Result<Settings>;
    fn save(&self, settings: &Settings) -> anyhow::Result<()>;
}
