//! Error types for the façade.

use std::time::Duration;

use codex_client::ClientError;
use codex_protocol::JsonError;
use codex_transport::TransportError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors surfaced by [`Codex`](crate::Codex), [`Thread`](crate::Thread) and
/// [`TurnStream`](crate::TurnStream).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SdkError {
    /// The app-server process could not be started
    #[error("failed to start app-server: {0}")]
    Spawn(#[source] TransportError),

    /// Call, notification or session failure from the client core
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An option value could not be serialized
    #[error("invalid option: {0}")]
    InvalidOption(#[from] JsonError),

    /// The initialize handshake did not finish in time
    #[error("initialize did not complete within {0:?}")]
    InitTimeout(Duration),

    /// `thread/start` or `thread/resume` returned no usable id
    #[error("thread id not found in response")]
    MissingThreadId,

    /// The turn ended with a failure reported by the app-server
    #[error("{0}")]
    TurnFailed(String),
}

impl SdkError {
    /// True when the underlying session has terminated
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_closed())
    }
}
