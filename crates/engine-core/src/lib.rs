pub mod aggregate;
pub mod decode;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod output;
