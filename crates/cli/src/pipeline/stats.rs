//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::ClassificationAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Samples pulled off the ingestion channel
    pub samples_processed: u64,

    /// Samples dropped by ingestion backpressure
    pub samples_dropped: u64,

    /// Samples an engine refused (out of order, unknown or aborted stream)
    pub samples_rejected: u64,

    pub results: u64,

    pub inference_failures: u64,

    /// Streams stopped after too many consecutive inference failures
    pub aborted_streams: Vec<String>,

    pub duration: Duration,

    pub active_streams: usize,

    /// Final per-sink counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    pub classification: ClassificationAggregator,
}

impl PipelineStats {
    /// Samples per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");
        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Streams: {}", self.active_streams);
        println!("   ├─ Samples processed: {}", self.samples_processed);
        println!("   ├─ Samples dropped: {}", self.samples_dropped);
        println!("   ├─ Samples rejected: {}", self.samples_rejected);
        println!("   ├─ Results: {}", self.results);
        println!("   ├─ Inference failures: {}", self.inference_failures);
        println!("   └─ Throughput: {:.2} samples/s", self.throughput());

        if !self.aborted_streams.is_empty() {
            println!("\nAborted streams: {}", self.aborted_streams.join(", "));
        }

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let prefix = if i + 1 == self.sinks.len() { "└─" } else { "├─" };
                println!(
                    "   {} {}: written={}, failed={}, dropped={}",
                    prefix,
                    name,
                    snapshot.write_count,
                    snapshot.failure_count,
                    snapshot.dropped_count
                );
            }
        }

        println!("\n{}", self.classification.summary());
    }
}
