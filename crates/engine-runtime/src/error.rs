use connectors::error::{SinkError, SourceError};
use engine_config::{error::UsageError, settings::error::SettingsError};
use engine_core::error::LifecycleError;
use engine_processing::error::ProcessingError;
use thiserror::Error;

/// Top-level errors of an aggregation job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Wrong positional arguments; the job never started.
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A partition, merge or write task failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Job cancelled")]
    Cancelled,

    /// A task panicked or was aborted outside of cancellation.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
