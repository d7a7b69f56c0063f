//! Error types for CLI operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// No stream has a sample source
    #[error("No sample source could be started: {message}")]
    NoSources { message: String },

    /// No stream could load its model
    #[error("Model unavailable: {message}")]
    ModelUnavailable { message: String },

    /// Every session was aborted after repeated inference failures
    #[error("All streams aborted after repeated inference failures: {streams}")]
    AllStreamsAborted { streams: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }

    pub fn no_sources(message: impl Into<String>) -> Self {
        Self::NoSources {
            message: message.into(),
        }
    }
}
