use crate::error::ProcessingError;
use connectors::sink::OutputSink;
use engine_core::{aggregate::FinalAggregator, metrics::Metrics, output::OutputWriter};
use model::records::sum::{FinalSum, PartialSum};
use std::collections::BTreeMap;
use tracing::debug;

/// Every partial sum routed to one reducer, grouped by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyGroups {
    pub reducer: usize,
    pub groups: BTreeMap<String, Vec<PartialSum>>,
}

impl KeyGroups {
    pub fn new(reducer: usize) -> Self {
        KeyGroups {
            reducer,
            groups: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, partial: PartialSum) {
        self.groups
            .entry(partial.key.clone())
            .or_default()
            .push(partial);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Final sums of one reducer, ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPart {
    pub reducer: usize,
    pub sums: Vec<FinalSum>,
}

pub fn merge_groups(groups: KeyGroups, metrics: &Metrics) -> Result<MergedPart, ProcessingError> {
    let reducer = groups.reducer;
    let sums = groups
        .groups
        .into_iter()
        .map(|(key, partials)| {
            let mut aggregator = FinalAggregator::new(key);
            for partial in partials {
                aggregator.push(partial)?;
            }
            aggregator.finish()
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ProcessingError::Merge { reducer, source })?;

    metrics.increment_keys(sums.len() as u64);
    debug!(reducer, keys = sums.len(), "Reducer merged");
    Ok(MergedPart { reducer, sums })
}

/// Write one merged part through the sink. Returns the lines written.
pub async fn write_part(
    sink: &dyn OutputSink,
    part: MergedPart,
    metrics: &Metrics,
) -> Result<u64, ProcessingError> {
    let reducer = part.reducer;
    let sink_err = |source| ProcessingError::Sink { reducer, source };

    let writer = sink.open_part(reducer).await.map_err(sink_err)?;
    let mut writer = OutputWriter::new(reducer, writer, metrics.clone());
    for sum in &part.sums {
        writer.write_sum(sum).await.map_err(sink_err)?;
    }
    writer.close().await.map_err(sink_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::file::text::sink::TextDirSink;
    use engine_core::error::MergeError;

    fn groups(partials: Vec<PartialSum>) -> KeyGroups {
        let mut groups = KeyGroups::new(0);
        for partial in partials {
            groups.push(partial);
        }
        groups
    }

    #[test]
    fn merges_each_key_in_order() {
        let merged = merge_groups(
            groups(vec![
                PartialSum::new("B", 5.0, 1),
                PartialSum::new("A", 10.5, 1),
                PartialSum::new("A", 2.5, 1),
            ]),
            &Metrics::new(),
        )
        .unwrap();

        assert_eq!(
            merged.sums,
            vec![FinalSum::new("A", 13.0), FinalSum::new("B", 5.0)]
        );
    }

    #[test]
    fn misrouted_partial_is_a_merge_error() {
        let mut broken = KeyGroups::new(2);
        broken
            .groups
            .insert("A".into(), vec![PartialSum::new("B", 1.0, 1)]);

        match merge_groups(broken, &Metrics::new()) {
            Err(ProcessingError::Merge { reducer, source }) => {
                assert_eq!(reducer, 2);
                assert!(matches!(source, MergeError::KeyMismatch { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_a_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TextDirSink::new(dir.path().join("out"));
        sink.prepare().await.unwrap();

        let metrics = Metrics::new();
        let part = MergedPart {
            reducer: 0,
            sums: vec![FinalSum::new("A", 13.0), FinalSum::new("B", 5.0)],
        };
        assert_eq!(write_part(&sink, part, &metrics).await.unwrap(), 2);
        sink.commit().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/part-00000")).unwrap(),
            "A\t13.0\nB\t5.0\n"
        );
        assert_eq!(metrics.snapshot().lines_written, 2);
    }
}
