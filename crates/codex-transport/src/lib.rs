//! # Codex Transport
//!
//! Line-oriented transports for talking to a Codex app-server. Every transport
//! implements [`LineTransport`]: read one line, write one line, close.
//!
//! - [`ProcessTransport`]: spawns the app-server and uses its stdin/stdout
//! - [`ConnTransport`]: wraps any `AsyncRead + AsyncWrite` stream
//! - [`ReplayTransport`]: plays back a recorded [`Transcript`]
//! - [`RecordTransport`]: wraps another transport and records a [`Transcript`]
//!
//! ```
//! use codex_transport::{LineTransport, ReplayTransport, Transcript};
//!
//! # tokio_test::block_on(async {
//! let replay = ReplayTransport::new(
//!     Transcript::new()
//!         .write(r#"{"id":1,"method":"ping"}"#)
//!         .read(r#"{"id":1,"result":{}}"#),
//! );
//! replay.write_line(r#"{"method":"ping","id":1}"#).await.unwrap();
//! assert_eq!(replay.read_line().await.unwrap(), r#"{"id":1,"result":{}}"#);
//! # });
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod conn;
pub mod error;
mod lines;
pub mod process;
pub mod replay;
pub mod traits;
pub mod transcript;

pub use conn::{ConnConfig, ConnTransport};
pub use error::{TransportError, TransportResult};
pub use lines::DEFAULT_MAX_LINE_LENGTH;
pub use process::{ProcessConfig, ProcessTransport, StderrSink};
pub use replay::{RecordTransport, ReplayTransport};
pub use traits::LineTransport;
pub use transcript::{Direction, Transcript, TranscriptEntry, lines_match};
