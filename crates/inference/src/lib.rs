//! # Inference
//!
//! Concrete [`InferenceEngine`]s:
//! - [`LinearModel`]: softmax over a linear layer read from a model file
//! - [`StubEngine`]: rule-based stand-in used when no model is configured
//! - [`ModelSlot`]: empty until a model is installed
//! - [`ScriptedEngine`]: fixed outputs, for tests

mod linear;
mod scripted;
mod slot;
mod stub;

pub use contracts::{InferenceEngine, InferenceError};
pub use linear::{softmax, LinearModel};
pub use scripted::{one_hot, ScriptedEngine};
pub use slot::ModelSlot;
pub use stub::{StubEngine, StubThresholds};

use contracts::{ModelConfig, ModelKind, PipelineConfig};

/// Type-erased engine, one per stream
pub type BoxedEngine = Box<dyn InferenceEngine + Send>;

/// Build the engine described by `config`
///
/// A linear model must match the stream's window layout.
pub fn load_engine(
    config: &ModelConfig,
    pipeline: &PipelineConfig,
) -> Result<BoxedEngine, InferenceError> {
    match config.kind {
        ModelKind::Stub => Ok(Box::new(StubEngine::default())),
        ModelKind::Linear => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| InferenceError::invalid_model("linear model requires a path"))?;
            let model = LinearModel::from_path(path)?;
            let expected = pipeline.window.layout();
            if model.layout() != expected {
                return Err(InferenceError::shape_mismatch(
                    format!("{}x{}x6", expected.segments, expected.segment_length),
                    format!(
                        "{}x{}x6",
                        model.layout().segments,
                        model.layout().segment_length
                    ),
                ));
            }
            Ok(Box::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::WindowLayout;
    use std::io::Write;

    fn model_file(layout: WindowLayout) -> tempfile::NamedTempFile {
        let model = LinearModel::new(
            [layout.segments, layout.segment_length, 6],
            vec![vec![0.0; layout.input_len()]; 5],
            vec![0.0; 5],
        )
        .unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&model).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn test_stub_by_default() {
        let engine = load_engine(&ModelConfig::default(), &PipelineConfig::default()).unwrap();
        assert_eq!(engine.name(), "stub");
    }

    #[test]
    fn test_linear_layout_must_match() {
        let file = model_file(WindowLayout::new(2, 25));
        let config = ModelConfig {
            kind: ModelKind::Linear,
            path: Some(file.path().to_path_buf()),
        };
        assert!(load_engine(&config, &PipelineConfig::default()).is_ok());

        let mut flat = PipelineConfig::default();
        flat.window.segments = 1;
        assert!(matches!(
            load_engine(&config, &flat),
            Err(InferenceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_linear_without_path() {
        let config = ModelConfig {
            kind: ModelKind::Linear,
            path: None,
        };
        assert!(matches!(
            load_engine(&config, &PipelineConfig::default()),
            Err(InferenceError::InvalidModel { .. })
        ));
    }
}
