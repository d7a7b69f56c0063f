//! Linear softmax model loaded from a JSON file.
//!
//! File layout:
//! ```json
//! { "input_shape": [2, 25, 6], "weights": [[...], ...], "bias": [...] }
//! ```
//! `weights` holds one row per class, each row covers the flattened window
//! (segment, timestep, channel).

use std::path::Path;

use contracts::{InferenceEngine, InferenceError, LabelDistribution, Sample, WindowLayout, CHANNELS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// `[segments, segment_length, channels]`
    input_shape: [usize; 3],
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    #[serde(skip)]
    name: String,
}

impl LinearModel {
    pub fn new(
        input_shape: [usize; 3],
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            input_shape,
            weights,
            bias,
            name: "linear".to_string(),
        };
        model.check()?;
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, InferenceError> {
        let mut model: Self = serde_json::from_str(content)
            .map_err(|e| InferenceError::invalid_model(format!("model parse error: {e}")))?;
        model.name = "linear".to_string();
        model.check()?;
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::invalid_model(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut model = Self::from_json(&content)?;
        model.name = format!("linear:{}", path.display());
        tracing::info!(
            path = %path.display(),
            classes = model.classes(),
            input = ?model.input_shape,
            "linear model loaded"
        );
        Ok(model)
    }

    /// Window layout the model was trained on
    pub fn layout(&self) -> WindowLayout {
        WindowLayout::new(self.input_shape[0], self.input_shape[1])
    }

    pub fn classes(&self) -> usize {
        self.bias.len()
    }

    fn check(&self) -> Result<(), InferenceError> {
        if self.input_shape[2] != CHANNELS {
            return Err(InferenceError::invalid_model(format!(
                "input must have {CHANNELS} channels, got {}",
                self.input_shape[2]
            )));
        }
        if self.bias.is_empty() || self.weights.len() != self.bias.len() {
            return Err(InferenceError::invalid_model(format!(
                "{} weight rows for {} biases",
                self.weights.len(),
                self.bias.len()
            )));
        }
        let inputs = self.layout().input_len();
        if let Some((row, weights)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != inputs)
        {
            return Err(InferenceError::invalid_model(format!(
                "weight row {row} has {} entries, expected {inputs}",
                weights.len()
            )));
        }
        Ok(())
    }
}

impl InferenceEngine for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        window: &[Sample],
        layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError> {
        let expected = self.layout();
        if layout != expected || window.len() != expected.window_length() {
            return Err(InferenceError::shape_mismatch(
                shape(expected.segments, expected.segment_length),
                shape(layout.segments, window.len() / layout.segments.max(1)),
            ));
        }

        let input: Vec<f64> = window.iter().flat_map(|s| s.channels()).collect();
        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();
        Ok(LabelDistribution::new(softmax(&logits)))
    }
}

fn shape(segments: usize, segment_length: usize) -> String {
    format!("{segments}x{segment_length}x{CHANNELS}")
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
