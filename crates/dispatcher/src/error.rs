//! Dispatcher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Queue full, result dropped
    #[error("queue full for sink '{sink_name}', window {window_index} of '{stream_id}' dropped")]
    QueueFull {
        sink_name: String,
        stream_id: String,
        window_index: u64,
    },

    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
