use crate::metrics::Metrics;
use connectors::{error::SinkError, sink::PartWriter};
use model::records::sum::{FinalSum, format_line};
use tracing::debug;

/// Writes final sums of one reducer as `<key>\t<sum>` lines.
pub struct OutputWriter {
    reducer: usize,
    part: Box<dyn PartWriter>,
    metrics: Metrics,
}

impl OutputWriter {
    pub fn new(reducer: usize, part: Box<dyn PartWriter>, metrics: Metrics) -> Self {
        OutputWriter {
            reducer,
            part,
            metrics,
        }
    }

    pub async fn write(&mut self, key: &str, sum: f64) -> Result<(), SinkError> {
        self.part.write_line(&format_line(key, sum)).await?;
        self.metrics.increment_lines(1);
        Ok(())
    }

    pub async fn write_sum(&mut self, sum: &FinalSum) -> Result<(), SinkError> {
        self.write(&sum.key, sum.sum).await
    }

    pub async fn close(self) -> Result<u64, SinkError> {
        let lines = self.part.close().await?;
        debug!(reducer = self.reducer, lines, "Output part closed");
        Ok(lines)
    }
}
