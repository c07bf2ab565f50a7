//! Application configuration model.

use serde::{Deserialize, Serialize};

use crate::entry::TrimPolicy;

/// User-tunable settings for the generation pipeline.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PromptLensConfig {
    /// Credits reserved per generation attempt.
    pub generation_cost: u64,
    /// Balance granted when the remote profile is first created.
    pub initial_credits: u64,
    /// Maximum retained history entries; `None` = unlimited.
    pub max_entries: Option<usize>,
    /// Auto-clear window in days; `None` = never.
    pub retention_days: Option<u32>,
    /// Display lifetime of an undo record in milliseconds.
    pub undo_window_ms: u64,
    /// Ask for confirmation before spending credits.
    pub confirm_before_spend: bool,
    /// Compress images before upload.
    pub compress_uploads: bool,
}

impl Default for PromptLensConfig {
    fn default() -> Self {
        Self {
            generation_cost: 10,
            initial_credits: 10_000,
            max_entries: None,
            retention_days: None,
            undo_window_ms: 5_000,
            confirm_before_spend: false,
            compress_uploads: true,
        }
    }
}

impl PromptLensConfig {
    /// The trim policy derived from the retention settings.
    pub fn trim_policy(&self) -> TrimPolicy {
        TrimPolicy {
            max_entries: self.max_entries,
            max_age: self
                .retention_days
                .map(|days| chrono::Duration::days(i64::from(days))),
        }
    }

    /// Undo window as a std duration.
    pub fn undo_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.undo_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PromptLensConfig::default();
        assert_eq!(config.generation_cost, 10);
        assert_eq!(config.initial_credits, 10_000);
        assert_eq!(config.undo_window_ms, 5_000);
        assert!(config.max_entries.is_none());
        assert!(config.retention_days.is_none());
        assert!(!config.confirm_before_spend);
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let config: PromptLensConfig = toml::from_str("").unwrap();
        assert_eq!(config.generation_cost, 10);
        assert!(config.compress_uploads);
    }

    #[test]
    fn trim_policy_reflects_retention() {
        let config = PromptLensConfig {
            max_entries: Some(50),
            retention_days: Some(7),
            ..Default::default()
        };
        let policy = config.trim_policy();
        assert_eq!(policy.max_entries, Some(50));
        assert_eq!(policy.max_age, Some(chrono::Duration::days(7)));
    }
}
