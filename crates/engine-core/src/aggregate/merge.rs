use crate::error::MergeError;
use model::records::sum::{FinalSum, PartialSum};

/// Associative, commutative combination of two values for the same key.
///
/// The same operation serves as combiner inside a partition and as reducer
/// across partitions.
pub trait Merge: Sized {
    fn merge_in(&mut self, other: Self) -> Result<(), MergeError>;

    fn merge(mut self, other: Self) -> Result<Self, MergeError> {
        self.merge_in(other)?;
        Ok(self)
    }
}

impl Merge for PartialSum {
    fn merge_in(&mut self, other: PartialSum) -> Result<(), MergeError> {
        if self.key != other.key {
            return Err(MergeError::KeyMismatch {
                expected: self.key.clone(),
                found: other.key,
            });
        }
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }
}

/// Folds every partial sum of one key into its final total.
#[derive(Debug)]
pub struct FinalAggregator {
    key: String,
    acc: Option<PartialSum>,
}

impl FinalAggregator {
    pub fn new(key: impl Into<String>) -> Self {
        FinalAggregator {
            key: key.into(),
            acc: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn push(&mut self, partial: PartialSum) -> Result<(), MergeError> {
        match self.acc.as_mut() {
            Some(acc) => acc.merge_in(partial),
            None if partial.key == self.key => {
                self.acc = Some(partial);
                Ok(())
            }
            None => Err(MergeError::KeyMismatch {
                expected: self.key.clone(),
                found: partial.key,
            }),
        }
    }

    /// Number of raw pairs folded into this key so far.
    pub fn count(&self) -> u64 {
        self.acc.as_ref().map_or(0, |acc| acc.count)
    }

    pub fn finish(self) -> Result<FinalSum, MergeError> {
        let acc = self.acc.ok_or(MergeError::EmptyGroup)?;
        Ok(FinalSum::new(acc.key, acc.sum))
    }

    /// Merge a whole group. The key is taken from the first partial.
    pub fn merge<I>(partials: I) -> Result<FinalSum, MergeError>
    where
        I: IntoIterator<Item = PartialSum>,
    {
        let mut partials = partials.into_iter();
        let first = partials.next().ok_or(MergeError::EmptyGroup)?;

        let mut aggregator = FinalAggregator::new(first.key.clone());
        aggregator.push(first)?;
        for partial in partials {
            aggregator.push(partial)?;
        }
        aggregator.finish()
    }
}
