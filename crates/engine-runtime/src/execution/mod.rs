pub mod executor;
pub mod factory;
pub mod report;
pub mod scheduler;
pub mod shuffle;
