use connectors::error::{SinkError, SourceError};
use engine_core::error::{DecodeError, MergeError};
use thiserror::Error;

/// Failure of one partition or reducer task.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Partition {partition}, unit {position}: {source}")]
    Decode {
        partition: String,
        /// 1-based position of the unit within its partition.
        position: u64,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to read partition {partition}: {source}")]
    Source {
        partition: String,
        #[source]
        source: SourceError,
    },

    #[error("Partition {partition}: {source}")]
    Combine {
        partition: String,
        #[source]
        source: MergeError,
    },

    #[error("Reducer {reducer}: {source}")]
    Merge {
        reducer: usize,
        #[source]
        source: MergeError,
    },

    #[error("Failed to write output part {reducer}: {source}")]
    Sink {
        reducer: usize,
        #[source]
        source: SinkError,
    },
}
