use crate::{file::error::FileError, sql::error::DbError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while enumerating or reading partitions.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The structured store rejected a connection or query.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The filesystem could not be listed or read.
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// A partition was handed to a source that did not produce it.
    #[error("Partition {partition} does not belong to source '{source_name}'")]
    ForeignPartition {
        partition: String,
        source_name: String,
    },
}

/// Failures raised by the output location.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Output location {0} already exists and is not empty")]
    OutputExists(PathBuf),

    #[error("Output location {0} has not been prepared for writing")]
    NotPrepared(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}
