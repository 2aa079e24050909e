//! A conversation thread on the app-server.

use std::sync::Arc;

use codex_client::Client;
use codex_protocol::methods;
use codex_protocol::types::UserInput;
use tracing::{error, info};

use crate::error::{SdkError, SdkResult};
use crate::options::{TurnOptions, build_turn_params};
use crate::turn::{TurnResult, TurnStream, notification_error};

/// Handle to a started or resumed thread.
///
/// Cheap to clone; every clone shares the same client.
#[derive(Debug, Clone)]
pub struct Thread {
    client: Arc<Client>,
    id: String,
}

impl Thread {
    pub(crate) fn new(client: Arc<Client>, id: String) -> Self {
        Self { client, id }
    }

    /// The thread id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send a text prompt and wait for the turn to finish.
    ///
    /// # Errors
    ///
    /// See [`run_inputs`](Self::run_inputs).
    pub async fn run(
        &self,
        prompt: impl Into<String>,
        options: Option<&TurnOptions>,
    ) -> SdkResult<TurnResult> {
        self.run_inputs(vec![UserInput::text(prompt)], options).await
    }

    /// Send `inputs` and collect the turn's notifications until it ends.
    ///
    /// # Errors
    ///
    /// [`SdkError::TurnFailed`] on `turn/failed`, on `turn/completed` with
    /// status `failed`, and on an `error` notification that will not be
    /// retried. Client failures propagate unchanged.
    pub async fn run_inputs(
        &self,
        inputs: Vec<UserInput>,
        options: Option<&TurnOptions>,
    ) -> SdkResult<TurnResult> {
        let mut stream = self.run_streamed(inputs, options).await?;
        let mut result = TurnResult::default();

        loop {
            let note = stream.next().await?;
            result.record(&note);

            let finished =
                matches!(note.method.as_str(), methods::TURN_COMPLETED | methods::TURN_FAILED);
            if let Some(message) = notification_error(&note) {
                error!(
                    thread_id = %self.id,
                    turn_id = %result.turn_id,
                    error = %message,
                    "turn failed"
                );
                return Err(SdkError::TurnFailed(message));
            }
            if finished {
                info!(
                    thread_id = %self.id,
                    turn_id = %result.turn_id,
                    items = result.items.len(),
                    "turn completed"
                );
                return Ok(result);
            }
        }
    }

    /// Start a turn and return its notification stream.
    ///
    /// The stream is subscribed before `turn/start` is sent, so no
    /// notification of the turn is missed.
    ///
    /// # Errors
    ///
    /// Invalid options, or the `turn/start` call failing.
    pub async fn run_streamed(
        &self,
        inputs: Vec<UserInput>,
        options: Option<&TurnOptions>,
    ) -> SdkResult<TurnStream> {
        let notes = self.client.subscribe_notifications(0);
        let input_count = inputs.len();
        let params = build_turn_params(&self.id, inputs, options).inspect_err(|e| {
            error!(thread_id = %self.id, error = %e, "turn start failed");
        })?;

        info!(thread_id = %self.id, input_count, "starting turn");
        if let Err(e) = self.client.turn_start(&params).await {
            error!(thread_id = %self.id, error = %e, "turn start failed");
            return Err(e.into());
        }
        Ok(TurnStream::new(notes, self.id.clone()))
    }
}
