use crate::{aggregate::merge::Merge, error::MergeError};
use model::records::sum::{NormalizedPair, PartialSum};
use std::collections::{HashMap, hash_map::Entry};

/// Running sum per distinct key within one partition.
#[derive(Debug, Default)]
pub struct PartialAggregator {
    sums: HashMap<String, PartialSum>,
}

impl PartialAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, pair: NormalizedPair) -> Result<(), MergeError> {
        match self.sums.entry(pair.key.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().merge_in(pair.into()),
            Entry::Vacant(entry) => {
                entry.insert(pair.into());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// One partial per key seen, in no particular order.
    pub fn finalize(self) -> Vec<PartialSum> {
        self.sums.into_values().collect()
    }
}
