//! Evaluation error types

use std::path::PathBuf;

use contracts::{ContractError, InferenceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("unsupported recording format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// No recording is long enough for a single window
    #[error("no complete window of {length} samples in the data set")]
    NoWindows { length: usize },

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
