//! The read loop: the single consumer of the transport.
//!
//! Every inbound line is classified and routed to exactly one place:
//!
//! - **Response / Error** → the pending call with the same id (late ones are dropped)
//! - **Notification** → every live subscription
//! - **Request** → the installed [`ServerRequestHandler`](crate::ServerRequestHandler) on its
//!   own task
//!
//! A malformed line is logged and skipped. A terminal read error ends the session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use codex_protocol::jsonrpc::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND,
};
use codex_protocol::{Message, Notification, RequestId, parse_line};
use futures::FutureExt;
use tracing::{Instrument, debug, error, trace, warn};

use crate::client::Shared;
use crate::error::{ClientError, REASON_CONNECTION_CLOSED, ResponseError};
use crate::handler::dispatch_server_request;
use crate::pending::Outcome;

pub(crate) fn spawn_read_loop(shared: Arc<Shared>) {
    let span = shared.span.clone();
    tokio::spawn(read_loop(shared).instrument(span));
}

async fn read_loop(shared: Arc<Shared>) {
    debug!("read loop started");

    loop {
        let read = tokio::select! {
            biased;
            () = shared.session.cancelled() => break,
            read = shared.transport.read_line() => read,
        };

        match read {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                route_line(&shared, &line);
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "skipping unreadable line");
            }
            Err(e) => {
                let reason = if e.is_end_of_stream() {
                    REASON_CONNECTION_CLOSED.to_string()
                } else {
                    error!(error = %e, "transport read failed");
                    format!("transport read failed: {e}")
                };
                shared.terminate(&reason);
                break;
            }
        }
    }

    if let Err(e) = shared.transport.close().await {
        debug!(error = %e, "transport close after read loop failed");
    }
    debug!("read loop terminated");
}

fn route_line(shared: &Arc<Shared>, line: &str) {
    let message = match parse_line(line) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "skipping malformed line");
            return;
        }
    };

    match message {
        Message::Response(response) => {
            deliver(shared, response.id.as_ref(), Ok(response.result));
        }
        Message::Error(response) => {
            let id = response.id.clone();
            let error = ClientError::Response(ResponseError {
                id: response.id,
                error: response.error,
            });
            deliver(shared, id.as_ref(), Err(error));
        }
        Message::Notification(note) => publish(shared, note),
        Message::Request(request) => handle_server_request(shared, request),
    }
}

fn deliver(shared: &Shared, id: Option<&RequestId>, outcome: Outcome) {
    let Some(id) = id else {
        warn!("dropping response without an id");
        return;
    };
    if shared.pending.resolve(id, outcome) {
        trace!(%id, "routed response");
    } else {
        trace!(%id, "dropping response for unknown or expired request");
    }
}

fn publish(shared: &Shared, note: JsonRpcNotification) {
    let typed = match shared.decoder.decode(&note.method, note.params.as_ref()) {
        Ok(typed) => typed,
        Err(e) => {
            warn!(method = %note.method, error = %e, "failed to decode notification");
            None
        }
    };
    trace!(method = %note.method, "publishing notification");
    shared.subscribers.publish(&Notification {
        method: note.method,
        params: note.params,
        typed,
    });
}

fn handle_server_request(shared: &Arc<Shared>, request: JsonRpcRequest) {
    debug!(id = %request.id, method = %request.method, "server request");
    let handler = shared.handler.read().clone();
    let shared_task = shared.clone();
    let span = shared.span.clone();

    tokio::spawn(
        async move {
            let shared = shared_task;
            let JsonRpcRequest { id, method, params } = request;

            let reply = match handler {
                None => Err(JsonRpcError::new(METHOD_NOT_FOUND, "no handler configured")),
                Some(handler) => {
                    let dispatched = AssertUnwindSafe(dispatch_server_request(
                        handler.as_ref(),
                        &method,
                        params,
                    ))
                    .catch_unwind()
                    .await;
                    match dispatched {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(e)) => Err(e.to_rpc_error()),
                        Err(_) => {
                            error!(%id, %method, "server request handler panicked");
                            Err(JsonRpcError::internal_error(format!("handler panicked: {method}")))
                        }
                    }
                }
            };

            let sent = match reply {
                Ok(result) => {
                    shared.send(&method, &JsonRpcResponse::new(id.clone(), result)).await
                }
                Err(error) => {
                    debug!(
                        %id,
                        %method,
                        code = error.code,
                        message = %error.message,
                        "replying with error"
                    );
                    shared.send(&method, &JsonRpcErrorResponse::new(id.clone(), error)).await
                }
            };
            if let Err(e) = sent {
                warn!(%id, %method, error = %e, "failed to reply to server request");
            }
        }
        .instrument(span),
    );
}
