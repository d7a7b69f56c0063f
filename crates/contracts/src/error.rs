//! Layered error definitions
//!
//! Categorized by source: config / inference / stream / sink

use thiserror::Error;

use crate::{InferenceError, StreamId};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Inference Errors =====
    /// The inference engine failed on the current window
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// The model returned no score that can be ranked
    #[error("label distribution has no comparable score ({len} entries)")]
    InvalidDistribution { len: usize },

    // ===== Stream Errors =====
    /// Sample arrived with a timestamp older than its predecessor
    #[error("out-of-order sample on '{stream_id}': {timestamp} < {last_timestamp}")]
    OutOfOrderSample {
        stream_id: StreamId,
        timestamp: f64,
        last_timestamp: f64,
    },

    /// Sample addressed to a stream without a session
    #[error("unknown stream: {stream_id}")]
    UnknownStream { stream_id: StreamId },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the inference engine
    pub fn is_inference(&self) -> bool {
        matches!(self, Self::Inference(_) | Self::InvalidDistribution { .. })
    }

    /// Short machine-readable kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::Inference(InferenceError::Unavailable) => "inference_unavailable",
            Self::Inference(InferenceError::ShapeMismatch { .. }) => "shape_mismatch",
            Self::Inference(InferenceError::InvalidModel { .. }) => "invalid_model",
            Self::InvalidDistribution { .. } => "invalid_distribution",
            Self::OutOfOrderSample { .. } => "out_of_order",
            Self::UnknownStream { .. } => "unknown_stream",
            Self::SinkWrite { .. } => "sink_write",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
