//! The bidirectional JSON-RPC client.
//!
//! One [`Client`] owns one transport. A background read loop is the only
//! reader; calls, notifications and replies to server requests may be written
//! from any number of tasks at once.
//!
//! ```text
//!  call()/notify() ──write──▶ transport ──read──▶ read loop
//!        ▲                                          │
//!        │ oneshot                                  ├─ response/error ─▶ pending table
//!        └──────────────────────────────────────────┤
//!                                                   ├─ notification ───▶ every subscription
//!                                                   └─ request ────────▶ handler task ─▶ reply
//! ```

use std::future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use codex_protocol::jsonrpc::{JsonRpcNotification, JsonRpcRequest};
use codex_protocol::{NotificationDecoder, RequestId, encode_line, encode_params};
use codex_transport::LineTransport;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug};

use crate::config::{ClientConfig, ClientOptions};
use crate::dispatcher;
use crate::error::{ClientError, ClientResult, REASON_CLIENT_CLOSED};
use crate::handler::ServerRequestHandler;
use crate::pending::PendingTable;
use crate::subscription::{NotificationStream, Subscribers};

/// State shared between the client handle, the read loop and handler tasks.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) transport: Arc<dyn LineTransport>,
    pub(crate) pending: PendingTable,
    pub(crate) subscribers: Arc<Subscribers>,
    pub(crate) handler: RwLock<Option<Arc<dyn ServerRequestHandler>>>,
    pub(crate) decoder: Arc<dyn NotificationDecoder>,
    pub(crate) session: CancellationToken,
    pub(crate) span: Span,
    termination: OnceLock<String>,
    next_id: AtomicI64,
}

impl Shared {
    /// Move to the terminal state exactly once: fail every pending call, close
    /// every subscription and stop the read loop. Later calls return false.
    pub(crate) fn terminate(&self, reason: &str) -> bool {
        if self.termination.set(reason.to_string()).is_err() {
            return false;
        }
        debug!(reason, "client terminating");
        self.session.cancel();
        self.pending.fail_all(reason);
        self.subscribers.close_all(reason);
        true
    }

    pub(crate) fn termination_reason(&self) -> Option<&str> {
        self.termination.get().map(String::as_str)
    }

    fn closed_error(&self) -> ClientError {
        ClientError::Closed(
            self.termination_reason()
                .unwrap_or(REASON_CLIENT_CLOSED)
                .to_string(),
        )
    }

    fn ensure_open(&self) -> ClientResult<()> {
        match self.termination_reason() {
            Some(reason) => Err(ClientError::Closed(reason.to_string())),
            None => Ok(()),
        }
    }

    /// Serialize `message` and write it as one line.
    pub(crate) async fn send<T: Serialize + ?Sized>(
        &self,
        method: &str,
        message: &T,
    ) -> ClientResult<()> {
        let line = encode_line(message).map_err(|source| ClientError::Encode {
            method: method.to_string(),
            source,
        })?;
        match self.transport.write_line(&line).await {
            Ok(()) => Ok(()),
            Err(_) if self.session.is_cancelled() => Err(self.closed_error()),
            Err(e) => Err(ClientError::Transport(e)),
        }
    }
}

/// A JSON-RPC client bound to one transport.
///
/// Dropping the client terminates it; [`close`](Self::close) does the same and
/// also waits for the transport to shut down.
#[derive(Debug)]
pub struct Client {
    shared: Arc<Shared>,
    config: ClientConfig,
}

impl Client {
    /// Bind a client to `transport` and start its read loop.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new<T: LineTransport + 'static>(transport: T, options: ClientOptions) -> Self {
        let shared = Arc::new(Shared {
            transport: Arc::new(transport),
            pending: PendingTable::default(),
            subscribers: Arc::new(Subscribers::default()),
            handler: RwLock::new(options.request_handler),
            decoder: options.notification_decoder,
            session: CancellationToken::new(),
            span: options.span,
            termination: OnceLock::new(),
            next_id: AtomicI64::new(1),
        });
        dispatcher::spawn_read_loop(shared.clone());

        Self {
            shared,
            config: options.config,
        }
    }

    /// Call `method` and decode its result into `R`.
    ///
    /// Uses [`ClientConfig::request_timeout`]. Dropping the returned future
    /// abandons the call and frees its pending slot.
    ///
    /// # Errors
    ///
    /// Encoding, transport, peer, timeout and termination failures; see
    /// [`ClientError`].
    pub async fn call<P, R>(&self, method: &str, params: &P) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = encode_method_params(method, params)?;
        let value = self
            .request(method, params, self.config.request_timeout, None)
            .await?;
        decode_result(method, value)
    }

    /// As [`call`](Self::call) with an explicit deadline.
    pub async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = encode_method_params(method, params)?;
        let value = self.request(method, params, Some(timeout), None).await?;
        decode_result(method, value)
    }

    /// As [`call`](Self::call), abandoned with [`ClientError::Cancelled`] when
    /// `cancel` fires. Cancelling only stops the local wait.
    pub async fn call_until<P, R>(
        &self,
        method: &str,
        params: &P,
        cancel: &CancellationToken,
    ) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params = encode_method_params(method, params)?;
        let value = self
            .request(method, params, self.config.request_timeout, Some(cancel))
            .await?;
        decode_result(method, value)
    }

    /// Call with already-encoded params and return the raw result.
    pub async fn call_raw(&self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        self.request(method, params, self.config.request_timeout, None)
            .await
    }

    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> ClientResult<Value> {
        self.shared.ensure_open()?;
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(ClientError::Cancelled);
        }

        let id = RequestId::Number(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (_slot, rx) = self.shared.pending.register(&id);

        debug!(%id, method, "sending request");
        let request = JsonRpcRequest {
            id: id.clone(),
            method: method.to_string(),
            params,
        };
        self.shared.send(method, &request).await?;

        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };
        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            outcome = rx => outcome.unwrap_or_else(|_| Err(self.shared.closed_error())),
            () = self.shared.session.cancelled() => Err(self.shared.closed_error()),
            () = cancelled => {
                debug!(%id, method, "request cancelled by caller");
                Err(ClientError::Cancelled)
            }
            () = deadline => {
                debug!(%id, method, "request timed out");
                Err(ClientError::Timeout(timeout.unwrap_or_default()))
            }
        }
    }

    /// Send a notification. There is no acknowledgement.
    ///
    /// # Errors
    ///
    /// Encoding and transport failures, or a terminated client.
    pub async fn notify<P: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &P,
    ) -> ClientResult<()> {
        self.shared.ensure_open()?;
        let params = encode_method_params(method, params)?;
        debug!(method, "sending notification");
        self.shared
            .send(method, &JsonRpcNotification::new(method, params))
            .await
    }

    /// As [`notify`](Self::notify), failing with [`ClientError::Cancelled`]
    /// if `cancel` has already fired.
    pub async fn notify_until<P: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &P,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.notify(method, params).await
    }

    /// Start receiving notifications read from now on.
    ///
    /// `buffer_hint` sizes the initial queue; zero picks
    /// [`ClientConfig::subscription_capacity`]. The queue grows as needed.
    pub fn subscribe_notifications(&self, buffer_hint: usize) -> NotificationStream {
        let capacity = if buffer_hint == 0 {
            self.config.subscription_capacity
        } else {
            buffer_hint
        };
        let stream = self.shared.subscribers.subscribe(capacity);
        if let Some(reason) = self.shared.termination_reason() {
            stream.close_terminated(reason);
        }
        stream
    }

    /// Install or remove the server request handler.
    pub fn set_request_handler(&self, handler: Option<Arc<dyn ServerRequestHandler>>) {
        *self.shared.handler.write() = handler;
    }

    /// Terminate the client and close the transport.
    ///
    /// Pending calls fail with `ClientError::Closed("client closed")` and every
    /// subscription ends. Safe to call more than once.
    pub async fn close(&self) -> ClientResult<()> {
        self.shared.terminate(REASON_CLIENT_CLOSED);
        self.shared.transport.close().await?;
        Ok(())
    }

    /// True once the client has terminated
    pub fn is_closed(&self) -> bool {
        self.shared.session.is_cancelled()
    }

    /// Resolves when the client terminates
    pub async fn closed(&self) {
        self.shared.session.cancelled().await;
    }

    /// Why the client terminated, if it has
    pub fn termination_reason(&self) -> Option<&str> {
        self.shared.termination_reason()
    }

    /// Calls still waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Live notification subscriptions
    pub fn subscriptions(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// The client's configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shared.terminate(REASON_CLIENT_CLOSED);
    }
}

fn encode_method_params<P: Serialize + ?Sized>(
    method: &str,
    params: &P,
) -> ClientResult<Option<Value>> {
    encode_params(params).map_err(|source| ClientError::Encode {
        method: method.to_string(),
        source,
    })
}

fn decode_result<R: DeserializeOwned>(method: &str, value: Value) -> ClientResult<R> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode {
        method: method.to_string(),
        source,
    })
}
