//! The line transport contract.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;

/// One newline-delimited message at a time, in each direction.
///
/// `read_line` is only ever called by a single reader. `write_line` may be
/// called concurrently and every call lands on the wire as one whole line.
/// `close` must make a blocked `read_line` return promptly.
#[async_trait]
pub trait LineTransport: Send + Sync + Debug {
    /// Read the next line without its trailing newline.
    ///
    /// Returns [`TransportError::Eof`](crate::TransportError::Eof) at end of
    /// stream and [`TransportError::Closed`](crate::TransportError::Closed)
    /// after `close`.
    async fn read_line(&self) -> TransportResult<String>;

    /// Write one line. A trailing newline is added if missing.
    async fn write_line(&self, line: &str) -> TransportResult<()>;

    /// Release the underlying resources.
    async fn close(&self) -> TransportResult<()>;
}

#[async_trait]
impl<T: LineTransport + ?Sized> LineTransport for Arc<T> {
    async fn read_line(&self) -> TransportResult<String> {
        (**self).read_line().await
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        (**self).write_line(line).await
    }

    async fn close(&self) -> TransportResult<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    async fn read_line(&self) -> TransportResult<String> {
        (**self).read_line().await
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        (**self).write_line(line).await
    }

    async fn close(&self) -> TransportResult<()> {
        (**self).close().await
    }
}
