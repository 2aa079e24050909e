//! Transport over any bidirectional byte stream (socket, pipe, in-memory duplex).

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TransportResult;
use crate::lines::{DEFAULT_MAX_LINE_LENGTH, LineIo};
use crate::traits::LineTransport;

/// Configuration for [`ConnTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnConfig {
    /// Maximum line length in bytes
    pub max_line_length: usize,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Line transport over a duplex stream.
#[derive(Debug)]
pub struct ConnTransport {
    io: LineIo,
}

impl ConnTransport {
    /// Wrap a stream that is both readable and writable.
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_config(stream, ConnConfig::default())
    }

    /// Wrap a stream with explicit configuration.
    pub fn with_config<S>(stream: S, config: ConnConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(reader, writer, config)
    }

    /// Build from separate read and write halves.
    pub fn from_parts<R, W>(reader: R, writer: W, config: ConnConfig) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            io: LineIo::new(Box::new(reader), Box::new(writer), config.max_line_length),
        }
    }
}

#[async_trait]
impl LineTransport for ConnTransport {
    async fn read_line(&self) -> TransportResult<String> {
        self.io.read_line().await
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        self.io.write_line(line).await
    }

    async fn close(&self) -> TransportResult<()> {
        self.io.close().await
    }
}
