//! Error types for the file stream

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for file stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a file stream
#[derive(Debug, Error)]
pub enum Error {
    /// The output file could not be created or truncated for writing.
    #[error("failed to open {path} for writing: {source}")]
    Open {
        /// The path that failed to open
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// The stream has shut down, or never started.
    #[error("stream is closed")]
    StreamClosed,

    /// A run loop has already claimed this stream.
    #[error("stream is already being driven by a run loop")]
    AlreadyRunning,
}

impl Error {
    /// Returns `true` for the closed sentinel.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::StreamClosed)
    }
}
