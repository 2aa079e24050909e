//! Connection entry point.

use std::sync::Arc;
use std::time::Duration;

use codex_client::{Client, ClientOptions, ClientResult};
use codex_protocol::types::{ClientInfo, InitializeParams, ThreadResponse};
use codex_transport::{LineTransport, ProcessTransport};
use tracing::{debug, info, warn};

use crate::error::{SdkError, SdkResult};
use crate::options::{Options, ThreadResumeOptions, ThreadStartOptions};
use crate::thread::Thread;

/// A connected, initialized app-server session.
#[derive(Debug, Clone)]
pub struct Codex {
    client: Arc<Client>,
}

impl Codex {
    /// Connect and run the `initialize` handshake.
    ///
    /// Spawns `codex app-server` unless [`Options::transport`] is set. The
    /// handshake is bounded by [`Options::init_timeout`]; the spawned process
    /// itself lives until [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// The process failing to start, the handshake failing or timing out.
    /// The client is closed before the error is returned.
    pub async fn connect(options: Options) -> SdkResult<Self> {
        let Options {
            transport,
            spawn,
            client_info,
            approval_handler,
            init_timeout,
            client: config,
            span,
        } = options;

        let transport: Arc<dyn LineTransport> = match transport {
            Some(transport) => {
                info!("using custom transport");
                transport
            }
            None => {
                let process = spawn.into_process_config();
                info!(
                    path = %process.program,
                    args = %process.args.join(" "),
                    "starting app-server"
                );
                Arc::new(ProcessTransport::spawn(process).map_err(SdkError::Spawn)?)
            }
        };

        let mut client_options = ClientOptions::default().with_config(config).with_span(span);
        if let Some(handler) = approval_handler {
            client_options = client_options.with_request_handler(handler);
        }
        let client = Client::new(transport, client_options);

        let info = client_info.unwrap_or_else(default_client_info);
        if let Err(e) = handshake(&client, info, init_timeout).await {
            warn!(error = %e, "initialize failed");
            if let Err(close_err) = client.close().await {
                debug!(error = %close_err, "closing client after failed initialize");
            }
            return Err(e);
        }
        info!("codex initialized");

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// The underlying client, for calls the façade does not cover.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Close the session and stop the app-server.
    ///
    /// # Errors
    ///
    /// The transport failing to shut down.
    pub async fn close(&self) -> SdkResult<()> {
        self.client.close().await?;
        Ok(())
    }

    /// Start a new thread.
    ///
    /// # Errors
    ///
    /// Invalid options, a failed call, or [`SdkError::MissingThreadId`].
    pub async fn start_thread(&self, options: ThreadStartOptions) -> SdkResult<Thread> {
        let params = options.to_params()?;
        let response = self.client.thread_start(&params).await?;
        let id = thread_id(&response)?;
        info!(thread_id = %id, "thread started");
        Ok(Thread::new(self.client.clone(), id))
    }

    /// Resume a persisted or in-memory thread.
    ///
    /// # Errors
    ///
    /// Invalid options, a failed call, or [`SdkError::MissingThreadId`].
    pub async fn resume_thread(&self, options: ThreadResumeOptions) -> SdkResult<Thread> {
        let params = options.to_params()?;
        let response = self.client.thread_resume(&params).await?;
        let id = thread_id(&response)?;
        info!(thread_id = %id, "thread resumed");
        Ok(Thread::new(self.client.clone(), id))
    }
}

async fn handshake(client: &Client, info: ClientInfo, limit: Option<Duration>) -> SdkResult<()> {
    let exchange = async {
        client.initialize(&InitializeParams { client_info: info }).await?;
        client.initialized().await
    };
    let outcome: ClientResult<()> = match limit {
        Some(limit) => match tokio::time::timeout(limit, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(SdkError::InitTimeout(limit)),
        },
        None => exchange.await,
    };
    outcome.map_err(SdkError::from)
}

fn thread_id(response: &ThreadResponse) -> SdkResult<String> {
    response
        .id()
        .map(str::to_string)
        .ok_or(SdkError::MissingThreadId)
}

/// Identity sent when [`Options::client_info`] is unset.
pub fn default_client_info() -> ClientInfo {
    ClientInfo::new("codex-rust-sdk", env!("CARGO_PKG_VERSION")).with_title("Codex Rust SDK")
}
