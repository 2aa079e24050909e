//! Client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use codex_protocol::{KnownNotifications, NotificationDecoder};
use tracing::Span;

use crate::handler::ServerRequestHandler;

/// Default initial queue capacity for a notification subscription
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 64;

/// Tunables for [`Client`](crate::Client).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Applied to [`Client::call`](crate::Client::call); `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Initial queue capacity used when a subscription passes a zero hint
    pub subscription_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            subscription_capacity: DEFAULT_SUBSCRIPTION_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Set the default request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the default subscription capacity
    #[must_use]
    pub fn with_subscription_capacity(mut self, capacity: usize) -> Self {
        self.subscription_capacity = capacity.max(1);
        self
    }
}

/// Everything a [`Client`](crate::Client) is built with besides its transport.
#[derive(Clone)]
pub struct ClientOptions {
    /// Tunables
    pub config: ClientConfig,
    /// Answers server-initiated requests; `None` replies "no handler configured"
    pub request_handler: Option<Arc<dyn ServerRequestHandler>>,
    /// Produces typed views of notifications
    pub notification_decoder: Arc<dyn NotificationDecoder>,
    /// Parent span for the read loop and server request tasks
    pub span: Span,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            config: ClientConfig::default(),
            request_handler: None,
            notification_decoder: Arc::new(KnownNotifications),
            span: Span::none(),
        }
    }
}

impl ClientOptions {
    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a server request handler
    #[must_use]
    pub fn with_request_handler(mut self, handler: Arc<dyn ServerRequestHandler>) -> Self {
        self.request_handler = Some(handler);
        self
    }

    /// Replace the notification decoder
    #[must_use]
    pub fn with_notification_decoder(mut self, decoder: Arc<dyn NotificationDecoder>) -> Self {
        self.notification_decoder = decoder;
        self
    }

    /// Scope the client's events under `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("config", &self.config)
            .field("request_handler", &self.request_handler.is_some())
            .field("notification_decoder", &self.notification_decoder)
            .finish_non_exhaustive()
    }
}
