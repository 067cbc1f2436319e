//! core::config
//!
//! Sync settings schema and loading.
//!
//! Settings are deployment-scoped (one file per node, shared by all sites)
//! and supply the fixed merge commit message used when peer content is
//! merged into a local environment branch.
//!
//! # Example
//!
//! ```toml
//! merge_commit_message = "Sync published content from cluster peer"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing. A missing or blank merge commit
//! message is a configuration error; the branch updater treats it as fatal
//! for the current branch-update step only.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default merge commit message, used when no settings file is present.
const DEFAULT_MERGE_COMMIT_MESSAGE: &str = "Sync published content from cluster peer";

/// Errors from settings loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML.
    #[error("invalid settings syntax: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// A settings value failed validation.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Node-wide synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Commit message for merge commits created during sync.
    pub merge_commit_message: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            merge_commit_message: DEFAULT_MERGE_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl SyncSettings {
    /// Parse settings from a TOML string and validate them.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file and validate them.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Validate the settings values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the merge commit message is
    /// blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge_commit_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "merge_commit_message cannot be blank".into(),
            ));
        }
        Ok(())
    }

    /// The validated merge commit message.
    ///
    /// Re-validates at the point of use so that a settings object built
    /// programmatically with a blank message is still rejected.
    pub fn merge_commit_message(&self) -> Result<&str, ConfigError> {
        self.validate()?;
        Ok(self.merge_commit_message.as_str())
    }
}
