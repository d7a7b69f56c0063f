//! InferenceEngine contract
//!
//! The model is an opaque function from a window of samples to a
//! [`LabelDistribution`]. The pipeline never looks inside it.

use thiserror::Error;

use crate::{LabelDistribution, Sample, CHANNELS};

/// Shape of the window handed to the model
///
/// `segments × segment_length` samples, each with [`CHANNELS`] channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub segments: usize,
    pub segment_length: usize,
}

impl WindowLayout {
    pub const fn new(segments: usize, segment_length: usize) -> Self {
        Self {
            segments,
            segment_length,
        }
    }

    /// Total samples per window
    pub const fn window_length(&self) -> usize {
        self.segments * self.segment_length
    }

    /// Flat model input size (`window_length × CHANNELS`)
    pub const fn input_len(&self) -> usize {
        self.window_length() * CHANNELS
    }
}

/// Inference failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// No model is loaded
    #[error("model not loaded")]
    Unavailable,

    /// Window (or model output) size does not match what the model expects
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Model file could not be interpreted
    #[error("invalid model: {message}")]
    InvalidModel { message: String },
}

impl InferenceError {
    pub fn shape_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }
}

/// Pre-trained activity model
///
/// Called synchronously from the stream's worker with the full window in
/// chronological order.
pub trait InferenceEngine {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Score one window
    fn run(
        &mut self,
        window: &[Sample],
        layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(
        &mut self,
        window: &[Sample],
        layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError> {
        (**self).run(window, layout)
    }
}
