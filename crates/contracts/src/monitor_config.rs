//! MonitorConfig - Config Loader output
//!
//! Describes a complete monitoring session: streams, pipeline tuning,
//! model and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{PipelineConfig, StreamId};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Independent sample streams, one engine each
    pub streams: Vec<StreamConfig>,

    /// Pipeline tuning shared by every stream without an override
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Inference model
    #[serde(default)]
    pub model: ModelConfig,

    /// Sample channel between sources and engines
    #[serde(default)]
    pub ingestion: IngestionSettings,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl MonitorConfig {
    /// Pipeline tuning effective for one stream
    pub fn pipeline_for(&self, stream: &StreamConfig) -> PipelineConfig {
        stream
            .pipeline
            .clone()
            .unwrap_or_else(|| self.pipeline.clone())
    }

    pub fn stream(&self, id: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.id == id)
    }
}

/// One wearable sensor stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream ID (unique)
    pub id: StreamId,

    /// Device kind
    #[serde(default)]
    pub sensor: SensorKind,

    /// Native sample rate (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Per-stream tuning replacing the shared pipeline section
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

fn default_sample_rate() -> f64 {
    25.0
}

/// Wearable device kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[default]
    Respeck,
    Thingy,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Respeck => "respeck",
            Self::Thingy => "thingy",
        }
    }
}

/// Model selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,

    /// Model file, required for `linear`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Model implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Linear softmax model read from a JSON file
    Linear,
    /// Built-in heuristic, no model file
    #[default]
    Stub,
}

/// Sample channel tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSettings {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_channel_capacity() -> usize {
    1000
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

/// Drop policy (when the sample channel is full)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the oldest queued sample
    #[default]
    DropOldest,
    /// Drop the incoming sample
    DropNewest,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub name: String,

    pub sink_type: SinkType,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Structured log output
    Log,
    /// JSONL file per stream
    File,
}
