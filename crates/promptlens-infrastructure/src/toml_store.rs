//! Atomic TOML document persistence.
//!
//! A thin layer for safe persistence of small TOML documents: reads return
//! the default value for a missing file, writes go through a temp file in the
//! same directory followed by a rename so readers never observe a torn write.

use promptlens_core::error::{PromptLensError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// A handle to one TOML-serialized document on disk.
pub struct TomlStore<T> {
    path: PathBuf,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TomlStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document, returning `T::default()` when the file does not
    /// exist or is empty.
    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            PromptLensError::io(format!("Failed to read {:?}: {}", self.path, e))
        })?;
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Serializes and writes the document atomically (temp file + rename).
    pub fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PromptLensError::io(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
        let serialized = toml::to_string_pretty(value)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, serialized)
            .map_err(|e| PromptLensError::io(format!("Failed to write {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            PromptLensError::io(format!("Failed to rename {:?} into place: {}", tmp, e))
        })?;
        Ok(())
    }
}
