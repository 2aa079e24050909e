//! Server notifications and the method → payload registry.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::methods;
use crate::types::{ErrorNotification, ItemCompletedNotification, TurnNotification};

/// Typed view of a notification whose method is known.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ServerNotification {
    /// `turn/started`
    TurnStarted(TurnNotification),
    /// `turn/completed`
    TurnCompleted(TurnNotification),
    /// `turn/failed`
    TurnFailed(TurnNotification),
    /// `item/completed`
    ItemCompleted(ItemCompletedNotification),
    /// `error`
    Error(ErrorNotification),
}

impl ServerNotification {
    /// Thread the notification belongs to, when it names one.
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Self::TurnStarted(n) | Self::TurnCompleted(n) | Self::TurnFailed(n) => {
                n.thread_id.as_deref()
            }
            Self::ItemCompleted(n) => n.thread_id.as_deref(),
            Self::Error(n) => n.thread_id.as_deref(),
        }
    }
}

/// A notification as delivered to subscribers.
///
/// `params` is always the raw payload from the wire. `typed` is set only when
/// the installed [`NotificationDecoder`] recognised the method and the payload
/// decoded cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method name
    pub method: String,
    /// Raw params
    pub params: Option<Value>,
    /// Typed view, if any
    pub typed: Option<ServerNotification>,
}

impl Notification {
    /// Build an untyped notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            typed: None,
        }
    }

    /// Decode the raw params into `T`. Absent params decode from `{}`.
    pub fn decode_params<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        decode_object(self.params.as_ref())
    }

    /// `threadId` from the typed view, falling back to the raw params.
    pub fn thread_id(&self) -> Option<&str> {
        if let Some(id) = self.typed.as_ref().and_then(ServerNotification::thread_id) {
            return Some(id);
        }
        self.params
            .as_ref()
            .and_then(|p| p.get("threadId"))
            .and_then(Value::as_str)
    }
}

/// Maps a notification method to its typed payload.
pub trait NotificationDecoder: Send + Sync + fmt::Debug {
    /// `Ok(None)` for methods the decoder does not know.
    fn decode(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Option<ServerNotification>, serde_json::Error>;
}

/// Decoder for the turn and item notifications the app-server emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownNotifications;

impl NotificationDecoder for KnownNotifications {
    fn decode(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> Result<Option<ServerNotification>, serde_json::Error> {
        let typed = match method {
            methods::TURN_STARTED => ServerNotification::TurnStarted(decode_object(params)?),
            methods::TURN_COMPLETED => ServerNotification::TurnCompleted(decode_object(params)?),
            methods::TURN_FAILED => ServerNotification::TurnFailed(decode_object(params)?),
            methods::ITEM_COMPLETED => ServerNotification::ItemCompleted(decode_object(params)?),
            methods::ERROR => ServerNotification::Error(decode_object(params)?),
            _ => return Ok(None),
        };
        Ok(Some(typed))
    }
}

fn decode_object<T: DeserializeOwned>(params: Option<&Value>) -> Result<T, serde_json::Error> {
    match params {
        Some(value) => T::deserialize(value),
        None => T::deserialize(Value::Object(Map::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_methods_decode() {
        let params = json!({"threadId": "thr_1", "turn": {"id": "turn_1"}});
        let typed = KnownNotifications.decode("turn/started", Some(&params)).unwrap().unwrap();
        assert_eq!(typed.thread_id(), Some("thr_1"));

        let typed = KnownNotifications.decode("error", None).unwrap().unwrap();
        assert!(matches!(typed, ServerNotification::Error(_)));
    }

    #[test]
    fn test_unknown_method_is_untyped() {
        let params = json!({"anything": true});
        assert!(KnownNotifications
            .decode("account/updated", Some(&params))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_schema_mismatch_is_an_error() {
        let params = json!({"threadId": 5});
        assert!(KnownNotifications.decode("turn/completed", Some(&params)).is_err());
    }

    #[test]
    fn test_thread_id_falls_back_to_raw() {
        let note = Notification::new("item/started", Some(json!({"threadId": "thr_9"})));
        assert_eq!(note.thread_id(), Some("thr_9"));
        assert_eq!(Notification::new("x", None).thread_id(), None);
    }
}
