//! Framed line I/O shared by the process and connection transports.

use std::fmt;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex as TokioMutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{TransportError, TransportResult};

/// Default maximum line length (10 MiB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 10 * 1024 * 1024;

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Framed reader plus whether its last item was a codec error.
///
/// `FramedRead` yields `None` once after an error before it resumes reading,
/// so that `None` is not end of stream.
struct LineReader {
    frames: FramedRead<BoxedReader, LinesCodec>,
    after_error: bool,
}

/// A reader half and a writer half framed with [`LinesCodec`].
///
/// Both halves sit behind `tokio::sync::Mutex` because they are held across
/// `.await`. Cancelling `closed` wakes a blocked reader.
pub(crate) struct LineIo {
    reader: TokioMutex<Option<LineReader>>,
    writer: TokioMutex<Option<FramedWrite<BoxedWriter, LinesCodec>>>,
    closed: CancellationToken,
    max_line_length: usize,
}

impl LineIo {
    pub(crate) fn new(reader: BoxedReader, writer: BoxedWriter, max_line_length: usize) -> Self {
        Self {
            reader: TokioMutex::new(Some(LineReader {
                frames: FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_length)),
                after_error: false,
            })),
            writer: TokioMutex::new(Some(FramedWrite::new(
                writer,
                LinesCodec::new_with_max_length(max_line_length),
            ))),
            closed: CancellationToken::new(),
            max_line_length,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    pub(crate) async fn read_line(&self) -> TransportResult<String> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let mut guard = self.reader.lock().await;
        let Some(reader) = guard.as_mut() else {
            return Err(TransportError::Closed);
        };

        loop {
            let next = tokio::select! {
                biased;
                () = self.closed.cancelled() => return Err(TransportError::Closed),
                next = reader.frames.next() => next,
            };
            match next {
                Some(Ok(line)) => {
                    reader.after_error = false;
                    trace!(bytes = line.len(), "read line");
                    return Ok(line);
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    reader.after_error = true;
                    return Err(TransportError::LineTooLong(self.max_line_length));
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(TransportError::Io(e)),
                None if std::mem::take(&mut reader.after_error) => {
                    trace!("resuming after skipped line");
                }
                None => return Err(TransportError::Eof),
            }
        }
    }

    pub(crate) async fn write_line(&self, line: &str) -> TransportResult<()> {
        let mut guard = self.writer.lock().await;
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let Some(writer) = guard.as_mut() else {
            return Err(TransportError::Closed);
        };

        let line = line.strip_suffix('\n').unwrap_or(line);
        let sent = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(TransportError::Closed),
            sent = writer.send(line) => sent,
        };
        sent.map_err(|e| match e {
            LinesCodecError::MaxLineLengthExceeded => {
                TransportError::LineTooLong(self.max_line_length)
            }
            LinesCodecError::Io(e) => TransportError::SendFailed(e.to_string()),
        })?;
        trace!(bytes = line.len(), "wrote line");
        Ok(())
    }

    /// Cancel readers, then flush and shut down the writer. Idempotent.
    pub(crate) async fn close(&self) -> TransportResult<()> {
        self.closed.cancel();

        let writer = self.writer.lock().await.take();
        let reader = self.reader.lock().await.take();
        drop(reader);

        if let Some(mut writer) = writer {
            // The peer may already be gone; a failed shutdown is not an error here.
            if let Err(e) = SinkExt::<&str>::close(&mut writer).await {
                trace!(error = %e, "writer shutdown failed");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for LineIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineIo")
            .field("closed", &self.closed.is_cancelled())
            .field("max_line_length", &self.max_line_length)
            .finish()
    }
}
