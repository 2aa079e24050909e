//! Turn streaming and aggregation.

use codex_client::{CancellationToken, NotificationStream};
use codex_protocol::types::{ErrorNotification, ItemCompletedNotification, TurnNotification};
use codex_protocol::{Notification, ServerNotification, methods};
use serde_json::Value;

use crate::error::SdkResult;

/// Notifications for one running turn.
///
/// Only notifications for this stream's thread are yielded. Notifications that
/// carry no `threadId` (account or session updates, for example) are yielded
/// too.
#[derive(Debug)]
pub struct TurnStream {
    notes: NotificationStream,
    thread_id: String,
}

impl TurnStream {
    pub(crate) fn new(notes: NotificationStream, thread_id: impl Into<String>) -> Self {
        Self {
            notes,
            thread_id: thread_id.into(),
        }
    }

    /// Thread this stream follows
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Wait for the next notification for this thread.
    ///
    /// # Errors
    ///
    /// The session terminated or the stream was closed.
    pub async fn next(&mut self) -> SdkResult<Notification> {
        loop {
            let note = self.notes.next().await?;
            if self.wants(&note) {
                return Ok(note);
            }
        }
    }

    /// As [`next`](Self::next), giving up when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`next`](Self::next), plus `Cancelled`.
    pub async fn next_until(&mut self, cancel: &CancellationToken) -> SdkResult<Notification> {
        loop {
            let note = self.notes.next_until(cancel).await?;
            if self.wants(&note) {
                return Ok(note);
            }
        }
    }

    /// Stop receiving notifications. Idempotent.
    pub fn close(&self) {
        self.notes.close();
    }

    fn wants(&self, note: &Notification) -> bool {
        if self.thread_id.is_empty() {
            return true;
        }
        match note.thread_id() {
            Some(id) if !id.is_empty() => id == self.thread_id,
            _ => true,
        }
    }
}

/// Everything observed during a completed turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnResult {
    /// Id of the turn, once a turn notification named it
    pub turn_id: String,
    /// Every notification the turn stream yielded, in order
    pub notifications: Vec<Notification>,
    /// Payloads of `item/completed` notifications
    pub items: Vec<Value>,
    /// Text of the last completed item that had any
    pub final_response: String,
}

impl TurnResult {
    pub(crate) fn record(&mut self, note: &Notification) {
        match note.method.as_str() {
            methods::ITEM_COMPLETED => {
                if let Some(item) = item_payload(note) {
                    if let Some(text) = extract_text(&item) {
                        self.final_response = text.to_string();
                    }
                    self.items.push(item);
                }
            }
            methods::TURN_STARTED | methods::TURN_COMPLETED | methods::TURN_FAILED => {
                if let Some(id) = turn_payload(note)
                    .and_then(|payload| payload.turn)
                    .map(|turn| turn.id)
                    .filter(|id| !id.is_empty())
                {
                    self.turn_id = id;
                }
            }
            _ => {}
        }
        self.notifications.push(note.clone());
    }
}

/// The failure a notification reports for the turn, if any.
///
/// `error` notifications fail the turn unless `willRetry` is set;
/// `turn/completed` fails only with status `failed`; `turn/failed` always
/// fails.
pub(crate) fn notification_error(note: &Notification) -> Option<String> {
    match note.method.as_str() {
        methods::ERROR => {
            let payload = match &note.typed {
                Some(ServerNotification::Error(payload)) => payload.clone(),
                _ => match note.decode_params::<ErrorNotification>() {
                    Ok(payload) => payload,
                    Err(_) => return Some("turn error".to_string()),
                },
            };
            if payload.will_retry == Some(true) {
                return None;
            }
            Some(
                payload
                    .error
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "turn error".to_string()),
            )
        }
        methods::TURN_COMPLETED => {
            let payload = turn_payload(note)?;
            let failed = payload.turn.as_ref().is_some_and(|t| t.status == "failed");
            failed.then(|| failure_message(note, &payload))
        }
        methods::TURN_FAILED => Some(match turn_payload(note) {
            Some(payload) => failure_message(note, &payload),
            None => "turn failed".to_string(),
        }),
        _ => None,
    }
}

fn failure_message(note: &Notification, payload: &TurnNotification) -> String {
    payload
        .turn
        .as_ref()
        .and_then(|t| t.error.as_ref())
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty())
        .or_else(|| {
            note.params
                .as_ref()
                .and_then(|p| p.pointer("/error/message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
        })
        .unwrap_or("turn failed")
        .to_string()
}

fn turn_payload(note: &Notification) -> Option<TurnNotification> {
    match &note.typed {
        Some(
            ServerNotification::TurnStarted(payload)
            | ServerNotification::TurnCompleted(payload)
            | ServerNotification::TurnFailed(payload),
        ) => Some(payload.clone()),
        _ => note.decode_params().ok(),
    }
}

fn item_payload(note: &Notification) -> Option<Value> {
    let item = match &note.typed {
        Some(ServerNotification::ItemCompleted(payload)) => payload.item.clone(),
        _ => note
            .decode_params::<ItemCompletedNotification>()
            .ok()
            .and_then(|payload| payload.item),
    };
    item.filter(|item| !item.is_null())
}

/// `text` of an item, either directly or one level down in a single-key
/// wrapper such as `{"agentMessage": {"text": ...}}`.
pub(crate) fn extract_text(item: &Value) -> Option<&str> {
    let direct = item.get("text").and_then(Value::as_str).filter(|t| !t.is_empty());
    if direct.is_some() {
        return direct;
    }
    let object = item.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object
        .values()
        .next()?
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}
