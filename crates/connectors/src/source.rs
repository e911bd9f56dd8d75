use crate::error::SourceError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use model::records::raw::RawUnit;
use std::{fmt, path::PathBuf};

/// Raw units of one partition, in source order.
pub type UnitStream = BoxStream<'static, Result<RawUnit, SourceError>>;

/// Where a partition's units come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSpec {
    /// One database shard; the query is owned by the source.
    Shard { url: String },
    /// A byte range of one text file.
    FileSplit { path: PathBuf, start: u64, len: u64 },
    /// An in-memory partition addressed by position.
    Memory { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub id: usize,
    pub spec: PartitionSpec,
}

impl Partition {
    pub fn new(id: usize, spec: PartitionSpec) -> Self {
        Partition { id, spec }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            PartitionSpec::Shard { url } => {
                write!(f, "#{} ({})", self.id, crate::sql::redact_url(url))
            }
            PartitionSpec::FileSplit { path, start, len } => {
                write!(f, "#{} ({}:{}+{})", self.id, path.display(), start, len)
            }
            PartitionSpec::Memory { index } => write!(f, "#{} (memory[{}])", self.id, index),
        }
    }
}

/// A partitioned input: structured store shards or text file splits.
///
/// Implementations must be safe to read from many partition tasks at once;
/// each `open` call returns an independent stream.
#[async_trait]
pub trait PartitionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Enumerate the partitions of this source.
    async fn partitions(&self) -> Result<Vec<Partition>, SourceError>;

    /// Open one partition for reading.
    async fn open(&self, partition: &Partition) -> Result<UnitStream, SourceError>;
}

pub(crate) fn foreign(source: &str, partition: &Partition) -> SourceError {
    SourceError::ForeignPartition {
        partition: partition.to_string(),
        source_name: source.to_string(),
    }
}
