use crate::{
    error::SourceError,
    source::{Partition, PartitionSource, PartitionSpec, UnitStream, foreign},
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use model::records::raw::RawUnit;
use std::sync::Arc;

/// A source whose partitions are already in memory.
///
/// Used to embed the pipeline without external storage and by the tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    partitions: Arc<Vec<Vec<RawUnit>>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, partitions: Vec<Vec<RawUnit>>) -> Self {
        MemorySource {
            name: name.into(),
            partitions: Arc::new(partitions),
        }
    }

    /// Split `lines` into `count` contiguous partitions of near-equal size.
    pub fn from_lines<S: AsRef<str>>(name: impl Into<String>, lines: &[S], count: usize) -> Self {
        let count = count.max(1);
        let per_partition = lines.len().div_ceil(count).max(1);
        let mut partitions: Vec<Vec<RawUnit>> = lines
            .chunks(per_partition)
            .map(|chunk| chunk.iter().map(|l| RawUnit::from(l.as_ref())).collect())
            .collect();
        partitions.resize_with(count.max(partitions.len()), Vec::new);
        MemorySource::new(name, partitions)
    }
}

#[async_trait]
impl PartitionSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn partitions(&self) -> Result<Vec<Partition>, SourceError> {
        Ok((0..self.partitions.len())
            .map(|index| Partition::new(index, PartitionSpec::Memory { index }))
            .collect())
    }

    async fn open(&self, partition: &Partition) -> Result<UnitStream, SourceError> {
        let PartitionSpec::Memory { index } = partition.spec else {
            return Err(foreign(&self.name, partition));
        };
        let units = self
            .partitions
            .get(index)
            .cloned()
            .ok_or_else(|| foreign(&self.name, partition))?;
        Ok(stream::iter(units.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn lines_are_spread_over_partitions() {
        let lines = ["a", "b", "c", "d", "e"];
        let source = MemorySource::from_lines("mem", &lines, 2);
        let partitions = source.partitions().await.unwrap();
        assert_eq!(partitions.len(), 2);

        let mut seen = Vec::new();
        for partition in &partitions {
            let units: Vec<RawUnit> = source.open(partition).await.unwrap().try_collect().await.unwrap();
            seen.extend(units);
        }
        let expected: Vec<RawUnit> = lines.iter().map(|l| RawUnit::from(*l)).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn more_partitions_than_lines_leaves_empty_partitions() {
        let source = MemorySource::from_lines("mem", &["a"], 4);
        assert_eq!(source.partitions().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn rejects_partitions_from_elsewhere() {
        let source = MemorySource::from_lines("mem", &["a"], 1);
        let stranger = Partition::new(
            0,
            PartitionSpec::Shard {
                url: "mysql://localhost/db".into(),
            },
        );
        assert!(matches!(
            source.open(&stranger).await,
            Err(SourceError::ForeignPartition { .. })
        ));
    }
}
