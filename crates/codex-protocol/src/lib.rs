//! # Codex Protocol
//!
//! Wire model for the Codex app-server: newline-delimited JSON-RPC messages,
//! polymorphic request ids, the method payloads this workspace drives and the
//! notification registry.
//!
//! ```
//! use codex_protocol::{Message, parse_line};
//!
//! let msg = parse_line(r#"{"id":1,"result":{"thread":{"id":"thr_123"}}}"#).unwrap();
//! assert!(matches!(msg, Message::Response(_)));
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

pub mod id;
pub mod json;
pub mod jsonrpc;
pub mod methods;
pub mod notifications;
#[allow(missing_docs)] // field names mirror the wire
pub mod types;

pub use id::{RequestId, parse_request_id};
pub use json::{JsonError, RawJson, normalize_field, to_raw_json};
pub use jsonrpc::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    Message, ParseError, encode_line, encode_params, parse_line,
};
pub use notifications::{KnownNotifications, Notification, NotificationDecoder, ServerNotification};
