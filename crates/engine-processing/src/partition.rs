use crate::error::ProcessingError;
use connectors::source::{Partition, PartitionSource};
use engine_core::{aggregate::PartialAggregator, decode::Decoder, metrics::Metrics};
use futures::StreamExt;
use model::records::sum::PartialSum;
use std::time::Instant;
use tracing::debug;

/// Partial sums produced by one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutput {
    pub partition: usize,
    pub units: u64,
    pub partials: Vec<PartialSum>,
}

/// Decode every unit of `partition` and sum it per key.
///
/// With `combine` off each decoded pair is forwarded as its own singleton
/// partial sum, which is what a pre-aggregated source already delivers.
pub async fn aggregate_partition(
    source: &dyn PartitionSource,
    partition: &Partition,
    decoder: &Decoder,
    combine: bool,
    metrics: &Metrics,
) -> Result<PartitionOutput, ProcessingError> {
    let start = Instant::now();
    let mut units = source
        .open(partition)
        .await
        .map_err(|source| ProcessingError::Source {
            partition: partition.to_string(),
            source,
        })?;

    let mut aggregator = PartialAggregator::new();
    let mut forwarded = Vec::new();
    let mut position: u64 = 0;

    while let Some(unit) = units.next().await {
        position += 1;
        let unit = unit.map_err(|source| ProcessingError::Source {
            partition: partition.to_string(),
            source,
        })?;
        let pair = decoder
            .decode(&unit)
            .map_err(|source| ProcessingError::Decode {
                partition: partition.to_string(),
                position,
                source,
            })?;

        if combine {
            aggregator
                .accumulate(pair)
                .map_err(|source| ProcessingError::Combine {
                    partition: partition.to_string(),
                    source,
                })?;
        } else {
            forwarded.push(PartialSum::from(pair));
        }
    }

    let partials = if combine {
        aggregator.finalize()
    } else {
        forwarded
    };

    metrics.increment_partitions(1);
    metrics.increment_units(position);
    metrics.increment_partials(partials.len() as u64);

    debug!(
        partition = %partition,
        rows = position,
        partials = partials.len(),
        took_ms = start.elapsed().as_millis() as u64,
        "Partition aggregated"
    );

    Ok(PartitionOutput {
        partition: partition.id,
        units: position,
        partials,
    })
}
