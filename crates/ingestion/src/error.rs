//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    /// Recording could not be read
    #[error("failed to read recording {}: {source}", path.display())]
    RecordingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recording line is not a valid sample record
    #[error("{}:{line}: {message}", path.display())]
    ParseFailed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Recording has no samples for the requested stream
    #[error("recording {} has no samples for stream '{stream_id}'", path.display())]
    EmptyRecording { path: PathBuf, stream_id: String },

    /// A source for this stream is already registered
    #[error("stream '{stream_id}' already has a source")]
    DuplicateStream { stream_id: String },
}

pub type Result<T> = std::result::Result<T, IngestionError>;
