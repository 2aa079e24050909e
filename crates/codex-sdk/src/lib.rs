//! # Codex SDK
//!
//! Threads and turns on top of [`codex_client`].
//!
//! [`Codex::connect`] spawns `codex app-server` (or uses a transport you
//! provide), runs the initialize handshake and hands out [`Thread`]s. A thread
//! runs turns either to completion ([`Thread::run`]) or as a stream of
//! notifications ([`Thread::run_streamed`]).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use codex_sdk::{AutoApproveHandler, Codex, Options, ThreadStartOptions};
//!
//! # async fn example() -> Result<(), codex_sdk::SdkError> {
//! let codex = Codex::connect(
//!     Options::default().with_approval_handler(Arc::new(AutoApproveHandler)),
//! )
//! .await?;
//!
//! let thread = codex.start_thread(ThreadStartOptions::default()).await?;
//! let result = thread.run("Summarize the README", None).await?;
//! println!("{}", result.final_response);
//!
//! codex.close().await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

mod approvals;
mod codex;
pub mod error;
pub mod option_values;
pub mod options;
mod thread;
mod turn;

pub use approvals::AutoApproveHandler;
pub use codex::{Codex, default_client_info};
pub use error::{SdkError, SdkResult};
pub use options::{
    DEFAULT_INIT_TIMEOUT, Options, SpawnOptions, ThreadResumeOptions, ThreadStartOptions,
    TurnOptions, build_turn_params,
};
pub use thread::Thread;
pub use turn::{TurnResult, TurnStream};

/// Structured turn input
pub use codex_protocol::types::UserInput as Input;
pub use codex_protocol::types::{
    INPUT_TYPE_IMAGE, INPUT_TYPE_LOCAL_IMAGE, INPUT_TYPE_SKILL, INPUT_TYPE_TEXT,
};
pub use codex_client::{CancellationToken, Client, ClientConfig, Notification, ServerNotification};
pub use codex_transport::{LineTransport, StderrSink};
