pub mod error;
pub mod partition;
pub mod reduce;
