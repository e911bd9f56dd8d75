use crate::error::SinkError;
use async_trait::async_trait;

/// The output location of a job.
///
/// The lifecycle is `cleanup` (optional) → `prepare` → `open_part`… →
/// `commit`, or `abort` on any failure. Nothing is visible as committed
/// output until `commit` succeeds.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    /// Delete whatever currently lives at the location.
    async fn cleanup(&self) -> Result<(), SinkError>;

    /// Create the location. Fails if it exists and is not empty.
    async fn prepare(&self) -> Result<(), SinkError>;

    /// Open the writer for one output part.
    async fn open_part(&self, index: usize) -> Result<Box<dyn PartWriter>, SinkError>;

    /// Publish every closed part.
    async fn commit(&self) -> Result<(), SinkError>;

    /// Discard anything written since `prepare`.
    async fn abort(&self) -> Result<(), SinkError>;
}

/// Appends lines to one output part.
#[async_trait]
pub trait PartWriter: Send {
    async fn write_line(&mut self, line: &str) -> Result<(), SinkError>;

    /// Flush and close. Returns the number of lines written.
    async fn close(self: Box<Self>) -> Result<u64, SinkError>;
}
