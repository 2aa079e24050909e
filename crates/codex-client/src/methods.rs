//! Typed wrappers over [`Client::call`] and [`Client::notify`].

use codex_protocol::methods;
use codex_protocol::types::{
    InitializeParams, InitializeResponse, ThreadResponse, ThreadResumeParams, ThreadStartParams,
    TurnStartParams,
};
use serde_json::Value;

use crate::client::Client;
use crate::error::ClientResult;

impl Client {
    /// `initialize`
    pub async fn initialize(&self, params: &InitializeParams) -> ClientResult<InitializeResponse> {
        self.call(methods::INITIALIZE, params).await
    }

    /// `initialized` notification, sent once after a successful `initialize`
    pub async fn initialized(&self) -> ClientResult<()> {
        self.notify(methods::INITIALIZED, &()).await
    }

    /// `thread/start`
    pub async fn thread_start(&self, params: &ThreadStartParams) -> ClientResult<ThreadResponse> {
        self.call(methods::THREAD_START, params).await
    }

    /// `thread/resume`
    pub async fn thread_resume(&self, params: &ThreadResumeParams) -> ClientResult<ThreadResponse> {
        self.call(methods::THREAD_RESUME, params).await
    }

    /// `turn/start`; the result shape is left open
    pub async fn turn_start(&self, params: &TurnStartParams) -> ClientResult<Value> {
        self.call(methods::TURN_START, params).await
    }
}
