//! Deterministic transports for tests: replay a transcript, or record one.

use std::pin::pin;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

use crate::error::{TransportError, TransportResult};
use crate::traits::LineTransport;
use crate::transcript::{Direction, Transcript, TranscriptEntry, lines_match};

#[derive(Debug, Default)]
struct Cursor {
    index: usize,
    closed: bool,
}

/// Plays back a [`Transcript`].
///
/// `read_line` waits until the cursor reaches a read entry, so a client may
/// start reading before it has issued the write that precedes the response.
/// `write_line` waits until the cursor reaches a write entry and checks the
/// line against it by JSON value. Once the transcript is exhausted, reads block
/// until `close` and writes fail.
#[derive(Debug)]
pub struct ReplayTransport {
    entries: Vec<TranscriptEntry>,
    cursor: Mutex<Cursor>,
    changed: Notify,
}

enum Step<T> {
    Ready(T),
    Wait,
}

impl ReplayTransport {
    /// Replay `transcript` from its first entry.
    pub fn new(transcript: impl Into<Transcript>) -> Self {
        Self {
            entries: transcript.into().into_iter().collect(),
            cursor: Mutex::new(Cursor::default()),
            changed: Notify::new(),
        }
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor.lock().index)
    }

    /// True once every entry has been consumed.
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until the cursor stops on `direction`, then let `step` consume it.
    async fn advance<T>(
        &self,
        mut step: impl FnMut(&mut Cursor, &[TranscriptEntry]) -> TransportResult<Step<T>>,
    ) -> TransportResult<T> {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();

            {
                let mut cursor = self.cursor.lock();
                if let Step::Ready(value) = step(&mut cursor, &self.entries)? {
                    drop(cursor);
                    self.changed.notify_waiters();
                    return Ok(value);
                }
            }

            notified.await;
        }
    }
}

#[async_trait]
impl LineTransport for ReplayTransport {
    async fn read_line(&self) -> TransportResult<String> {
        self.advance(|cursor, entries| {
            if cursor.closed {
                return Err(TransportError::Closed);
            }
            match entries.get(cursor.index) {
                Some(entry) if entry.direction == Direction::Read => {
                    cursor.index += 1;
                    trace!(index = cursor.index, "replayed read");
                    Ok(Step::Ready(entry.line.clone()))
                }
                _ => Ok(Step::Wait),
            }
        })
        .await
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        self.advance(|cursor, entries| {
            if cursor.closed {
                return Err(TransportError::Closed);
            }
            let Some(entry) = entries.get(cursor.index) else {
                return Err(TransportError::TranscriptExhausted(line.to_string()));
            };
            if entry.direction != Direction::Write {
                return Ok(Step::Wait);
            }
            if !lines_match(&entry.line, line) {
                return Err(TransportError::TranscriptMismatch {
                    expected: entry.line.clone(),
                    actual: line.to_string(),
                });
            }
            cursor.index += 1;
            trace!(index = cursor.index, "replayed write");
            Ok(Step::Ready(()))
        })
        .await
    }

    async fn close(&self) -> TransportResult<()> {
        self.cursor.lock().closed = true;
        self.changed.notify_waiters();
        Ok(())
    }
}

/// Wraps another transport and records every line that passes through.
#[derive(Debug)]
pub struct RecordTransport<T> {
    inner: T,
    transcript: Mutex<Transcript>,
}

impl<T: LineTransport> RecordTransport<T> {
    /// Start recording `inner`
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            transcript: Mutex::new(Transcript::new()),
        }
    }

    /// Snapshot of everything recorded so far
    pub fn transcript(&self) -> Transcript {
        self.transcript.lock().clone()
    }

    /// The wrapped transport
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: LineTransport> LineTransport for RecordTransport<T> {
    async fn read_line(&self) -> TransportResult<String> {
        let line = self.inner.read_line().await?;
        if !line.is_empty() {
            self.transcript.lock().push(TranscriptEntry::read(line.clone()));
        }
        Ok(line)
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        self.inner.write_line(line).await?;
        let line = line.strip_suffix('\n').unwrap_or(line);
        self.transcript.lock().push(TranscriptEntry::write(line));
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        self.inner.close().await
    }
}
