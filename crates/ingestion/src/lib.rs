//! # Ingestion
//!
//! Turns wearable sample sources into one ordered stream of samples per
//! stream id.
//!
//! - [`MockSampleSource`] synthesises chest-sensor motion profiles
//! - [`ReplaySource`] plays back JSONL recordings
//! - [`IngestionPipeline`] merges sources into a bounded async channel,
//!   applying the configured drop policy under backpressure
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MockSampleSource, MotionProfile};
//!
//! let mut pipeline = IngestionPipeline::new(1000);
//! pipeline.register_source(Box::new(MockSampleSource::profile(
//!     "respeck",
//!     MotionProfile::Walking,
//!     30.0,
//! )))?;
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_all();
//! while let Ok(item) = rx.recv().await {
//!     // item.stream_id, item.sample
//! }
//! ```

mod adapter;
mod config;
mod error;
mod mock;
mod pipeline;
mod replay;

use contracts::{Sample, StreamId};

pub use adapter::SourceAdapter;
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use error::{IngestionError, Result};
pub use mock::{MockSampleSource, MockSourceConfig, MotionProfile, ScriptStep};
pub use pipeline::IngestionPipeline;
pub use replay::{read_recording, RecordingRecord, ReplayConfig, ReplaySource};

/// A sample tagged with the stream it belongs to
#[derive(Debug, Clone)]
pub struct StreamSample {
    pub stream_id: StreamId,
    pub sample: Sample,
}
