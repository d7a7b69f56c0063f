//! ResultSink trait - dispatcher output interface

use crate::{ClassificationResult, ContractError};

/// Result output
#[trait_variant::make(ResultSink: Send)]
pub trait LocalResultSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one classification result
    async fn write(&mut self, result: &ClassificationResult) -> Result<(), ContractError>;

    /// Flush buffered output
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
