//! # Dispatcher
//!
//! Result fan-out.
//!
//! - Consumes `ClassificationResult`s
//! - Fans out to every configured sink
//! - Isolates slow sinks behind bounded queues so the engine never blocks

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{ClassificationResult, ResultSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};

#[cfg(test)]
pub(crate) mod test_support {
    use contracts::{
        ActivityClass, ClassificationResult, IconTag, LabelDistribution, RefinedLabel, TopClass,
    };

    pub fn result(stream_id: &str, window_index: u64) -> ClassificationResult {
        let top = TopClass::Known(ActivityClass::Walking);
        ClassificationResult {
            stream_id: stream_id.into(),
            window_index,
            timestamp: window_index as f64,
            top_class: top,
            refined: RefinedLabel::Walking,
            icon: IconTag::for_top_class(top),
            distribution: LabelDistribution::from([0.0, 0.0, 0.0, 1.0, 0.0]),
            step_count: Some(window_index * 2),
        }
    }
}
