pub mod merge;
pub mod partial;

pub use merge::{FinalAggregator, Merge};
pub use partial::PartialAggregator;
