use engine_processing::{partition::PartitionOutput, reduce::KeyGroups};
use model::core::utils::bucket_for;

/// Regroups the partial sums of all partitions so that every key ends up
/// in exactly one reducer's group.
pub trait Shuffle: Send + Sync {
    /// Returns one `KeyGroups` per reducer, indexed by reducer, including
    /// reducers that received no keys.
    fn regroup(&self, outputs: Vec<PartitionOutput>, reducers: usize) -> Vec<KeyGroups>;
}

/// Assigns keys to reducers by a stable hash of the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashShuffle;

impl Shuffle for HashShuffle {
    fn regroup(&self, outputs: Vec<PartitionOutput>, reducers: usize) -> Vec<KeyGroups> {
        let reducers = reducers.max(1);
        let mut groups: Vec<KeyGroups> = (0..reducers).map(KeyGroups::new).collect();

        for output in outputs {
            for partial in output.partials {
                let reducer = bucket_for(&partial.key, reducers);
                groups[reducer].push(partial);
            }
        }
        groups
    }
}
