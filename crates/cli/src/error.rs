use crate::shutdown::ExitCode;
use engine_config::{error::UsageError, settings::error::SettingsError};
use engine_runtime::error::JobError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Aggregation job failed: {0}")]
    Job(JobError),

    #[error("Failed to serialize the job report to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to write the job report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Shutdown requested")]
    ShutdownRequested,
}

impl From<JobError> for CliError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Usage(usage) => CliError::Usage(usage),
            JobError::Settings(settings) => CliError::Settings(settings),
            JobError::Cancelled => CliError::ShutdownRequested,
            other => CliError::Job(other),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Usage(_) => ExitCode::Usage,
            CliError::ShutdownRequested => ExitCode::ShutdownRequested,
            _ => ExitCode::GeneralError,
        }
    }
}
