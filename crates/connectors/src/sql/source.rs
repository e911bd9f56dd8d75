use crate::{
    error::SourceError,
    source::{Partition, PartitionSource, PartitionSpec, UnitStream, foreign},
    sql::{adapter::Adapter, redact_url},
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use model::records::raw::RawUnit;
use std::time::Instant;
use tracing::{debug, info};

/// One partition per database shard; every shard answers the same query.
#[derive(Debug, Clone)]
pub struct SqlPartitionSource {
    relation: String,
    query: String,
    urls: Vec<String>,
}

impl SqlPartitionSource {
    pub fn new(relation: impl Into<String>, query: impl Into<String>, urls: Vec<String>) -> Self {
        SqlPartitionSource {
            relation: relation.into(),
            query: query.into(),
            urls,
        }
    }
}

#[async_trait]
impl PartitionSource for SqlPartitionSource {
    fn name(&self) -> &str {
        &self.relation
    }

    async fn partitions(&self) -> Result<Vec<Partition>, SourceError> {
        Ok(self
            .urls
            .iter()
            .enumerate()
            .map(|(id, url)| Partition::new(id, PartitionSpec::Shard { url: url.clone() }))
            .collect())
    }

    async fn open(&self, partition: &Partition) -> Result<UnitStream, SourceError> {
        let PartitionSpec::Shard { url } = &partition.spec else {
            return Err(foreign(&self.relation, partition));
        };

        let start = Instant::now();
        info!(shard = %redact_url(url), sql = %self.query, "Querying shard");

        let adapter = Adapter::connect(url).await?;
        let result = adapter.get_sql().query_rows(&self.relation, &self.query).await;
        adapter.close().await;
        let rows = result?;

        debug!(
            shard = %redact_url(url),
            rows = rows.len(),
            took_ms = start.elapsed().as_millis() as u64,
            "Shard query finished"
        );

        Ok(stream::iter(rows.into_iter().map(|row| Ok(RawUnit::Row(row)))).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_partition_per_shard() {
        let source = SqlPartitionSource::new(
            "UserVisits",
            "SELECT 1",
            vec![
                "postgres://a/db".to_string(),
                "mysql://b/db".to_string(),
            ],
        );
        let partitions = source.partitions().await.unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(
            partitions[1].spec,
            PartitionSpec::Shard {
                url: "mysql://b/db".into()
            }
        );
    }

    #[tokio::test]
    async fn unknown_driver_fails_the_partition() {
        let source = SqlPartitionSource::new("t", "SELECT 1", vec!["oracle://x/y".to_string()]);
        let partitions = source.partitions().await.unwrap();
        let err = source.open(&partitions[0]).await.err().unwrap();
        assert!(matches!(err, SourceError::Database(_)));
    }
}
