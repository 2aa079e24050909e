//! Client error types.

use std::time::Duration;

use codex_protocol::{JsonRpcError, RequestId};
use codex_transport::TransportError;
use thiserror::Error;

/// Result alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Reason recorded when the read loop hits end of stream
pub const REASON_CONNECTION_CLOSED: &str = "connection closed";
/// Reason recorded by [`Client::close`](crate::Client::close)
pub const REASON_CLIENT_CLOSED: &str = "client closed";

/// The peer answered a call with a JSON-RPC error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ResponseError {
    /// Id of the failed request
    pub id: Option<RequestId>,
    /// Error payload as sent by the peer
    pub error: JsonRpcError,
}

impl ResponseError {
    /// Peer's error code
    pub fn code(&self) -> i64 {
        self.error.code
    }

    /// Peer's error message, verbatim
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Params could not be represented as JSON. Nothing was written.
    #[error("failed to encode params for {method}: {source}")]
    Encode {
        /// Method being called
        method: String,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// The result did not match the expected shape
    #[error("failed to decode result of {method}: {source}")]
    Decode {
        /// Method that was called
        method: String,
        /// Deserializer error
        #[source]
        source: serde_json::Error,
    },

    /// The peer replied with a JSON-RPC error
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The client has terminated; carries the termination reason
    #[error("{0}")]
    Closed(String),

    /// The subscription was closed by its owner
    #[error("subscription closed")]
    SubscriptionClosed,

    /// No response arrived in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation token fired
    #[error("request cancelled")]
    Cancelled,

    /// Writing to the transport failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// True once the client can no longer be used.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// The peer's error payload, for [`ClientError::Response`].
    pub fn response(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure reported by a [`ServerRequestHandler`](crate::ServerRequestHandler).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// The handler does not serve this request kind
    #[error("method not found: {0}")]
    NotImplemented(String),

    /// The handler refused or failed; the message is sent to the peer
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// A failure with the given message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
