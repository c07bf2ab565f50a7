//! On-disk settings and data locations.

use promptlens_core::config::PromptLensConfig;
use promptlens_core::error::{PromptLensError, Result};
use std::path::PathBuf;

use crate::toml_store::TomlStore;

const APP_DIR: &str = "promptlens";

/// Platform config directory for the app (`~/.config/promptlens` on Linux).
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| PromptLensError::config("Could not determine config directory"))
}

/// Platform data directory for history, saved prompts, ledger and blobs.
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| PromptLensError::config("Could not determine data directory"))
}

/// Handle to the persisted `PromptLensConfig` (config.toml).
pub struct SettingsStore {
    store: TomlStore<PromptLensConfig>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: TomlStore::new(path),
        }
    }

    /// Opens the store at the default platform location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(config_dir()?.join("config.toml")))
    }

    /// Loads settings, falling back to defaults when the file is absent.
    pub fn load(&self) -> Result<PromptLensConfig> {
        self.store.load()
    }

    pub fn save(&self, config: &PromptLensConfig) -> Result<()> {
        self.store.save(config)
    }
}
