//! # Codex Client
//!
//! Bidirectional JSON-RPC client core for the Codex app-server.
//!
//! A [`Client`] owns one [`LineTransport`](codex_transport::LineTransport) and
//! runs a single background read loop that:
//!
//! - correlates responses and errors with in-flight [`Client::call`]s by id
//! - fans every notification out to all live [`NotificationStream`]s
//! - answers server-initiated requests through a [`ServerRequestHandler`]
//!
//! ```no_run
//! use codex_client::{Client, ClientOptions};
//! use codex_protocol::types::{ClientInfo, InitializeParams, ThreadStartParams};
//! use codex_transport::{ProcessConfig, ProcessTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ProcessTransport::spawn(ProcessConfig::new("codex").with_args(["app-server"]))?;
//! let client = Client::new(transport, ClientOptions::default());
//!
//! client
//!     .initialize(&InitializeParams { client_info: ClientInfo::new("my-app", "0.1.0") })
//!     .await?;
//! client.initialized().await?;
//!
//! let mut notes = client.subscribe_notifications(0);
//! let thread = client.thread_start(&ThreadStartParams::default()).await?;
//! println!("thread {:?}", thread.id());
//! let first = notes.next().await?;
//! println!("{}", first.method);
//! client.close().await?;
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

mod client;
pub mod config;
mod dispatcher;
pub mod error;
pub mod handler;
mod methods;
mod pending;
mod subscription;

pub use client::Client;
pub use config::{ClientConfig, ClientOptions, DEFAULT_SUBSCRIPTION_CAPACITY};
pub use error::{
    ClientError, ClientResult, HandlerError, REASON_CLIENT_CLOSED, REASON_CONNECTION_CLOSED,
    ResponseError,
};
pub use handler::{DispatchError, ServerRequest, ServerRequestHandler, dispatch_server_request};
pub use subscription::NotificationStream;

pub use codex_protocol::{Notification, RequestId, ServerNotification};
pub use tokio_util::sync::CancellationToken;
