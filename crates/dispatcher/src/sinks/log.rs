//! LogSink - reports each result through tracing

use contracts::{ClassificationResult, ContractError, ResultSink};
use tracing::{info, instrument};

pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_result(&self, result: &ClassificationResult) {
        info!(
            sink = %self.name,
            stream_id = %result.stream_id,
            window_index = result.window_index,
            timestamp = result.timestamp,
            top_class = result.top_class.key(),
            steps = ?result.step_count,
            "{}",
            result.display_text()
        );
    }
}

impl ResultSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, result),
        fields(sink = %self.name, window_index = result.window_index)
    )]
    async fn write(&mut self, result: &ClassificationResult) -> Result<(), ContractError> {
        self.log_result(result);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "log sink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("console");
        assert_eq!(sink.name(), "console");
        assert!(sink.write(&result("respeck", 3)).await.is_ok());
        assert!(sink.close().await.is_ok());
    }
}
