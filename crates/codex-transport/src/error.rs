//! Transport error types.

use thiserror::Error;

/// Result alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors produced by a [`LineTransport`](crate::LineTransport).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Invalid transport configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The child process could not be started
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    /// The peer closed its side of the stream
    #[error("end of stream")]
    Eof,

    /// The transport was closed locally
    #[error("transport closed")]
    Closed,

    /// A line was longer than the configured maximum and was discarded
    #[error("line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    /// Failed to write a line
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to read a line
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// A written line differs from the next expected transcript entry
    #[error("unexpected write_line: got {actual}, want {expected}")]
    TranscriptMismatch {
        /// Line recorded in the transcript
        expected: String,
        /// Line the caller wrote
        actual: String,
    },

    /// A line was written after the transcript ran out of entries
    #[error("unexpected write_line: no transcript entries left (got {0})")]
    TranscriptExhausted(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True for the two end-of-stream conditions.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Eof | Self::Closed)
    }

    /// True when the session can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::LineTooLong(_))
    }
}
