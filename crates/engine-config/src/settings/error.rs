use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating job settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `.env` file line that is not `KEY=VALUE`.
    #[error("Invalid env file {path}: {reason} at line {line}")]
    EnvFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid setting {setting}: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },

    #[error("No database URLs configured (set structured.urls or TALLY_DB_URLS)")]
    NoShards,
}

impl SettingsError {
    pub(crate) fn invalid(setting: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            setting,
            reason: reason.into(),
        }
    }
}
