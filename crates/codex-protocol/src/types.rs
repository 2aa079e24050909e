//! Hand-written payloads for the app-server methods this workspace drives.
//!
//! Inbound types tolerate unknown fields. Outbound types omit every unset
//! optional field, so a default params value serializes to `{}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::json::RawJson;

/// Identifies the client to the app-server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Machine-readable client name
    pub name: String,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Client version
    pub version: String,
}

impl ClientInfo {
    /// Create client info without a title
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            version: version.into(),
        }
    }

    /// Set the human-readable title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// `initialize` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Who is connecting
    pub client_info: ClientInfo,
}

/// `initialize` result. The server's shape is kept open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitializeResponse {
    /// Every field the server sent
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `thread/start` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStartParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_policy: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_instructions: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub experimental_raw_events: bool,
}

/// `thread/resume` params.
///
/// The server prefers `history`, then `path`, then `threadId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResumeParams {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Option<RawJson>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_policy: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_instructions: Option<String>,
}

/// Minimal thread descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDescriptor {
    /// Thread id
    #[serde(default)]
    pub id: String,
}

/// Shared result shape of `thread/start` and `thread/resume`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResponse {
    /// Flat thread id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Nested thread descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadDescriptor>,
}

impl ThreadResponse {
    /// The thread id, preferring the flat field over `thread.id`.
    pub fn id(&self) -> Option<&str> {
        self.thread_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.thread.as_ref().map(|t| t.id.as_str()).filter(|id| !id.is_empty()))
    }
}

/// Input type for plain text
pub const INPUT_TYPE_TEXT: &str = "text";
/// Input type for a remote image
pub const INPUT_TYPE_IMAGE: &str = "image";
/// Input type for a local image
pub const INPUT_TYPE_LOCAL_IMAGE: &str = "localImage";
/// Input type for a skill invocation
pub const INPUT_TYPE_SKILL: &str = "skill";

/// One element of `turn/start` input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// One of the `INPUT_TYPE_*` values
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_elements: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserInput {
    /// Plain text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: INPUT_TYPE_TEXT.to_owned(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Remote image
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: INPUT_TYPE_IMAGE.to_owned(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Local image file
    pub fn local_image(path: impl Into<String>) -> Self {
        Self {
            kind: INPUT_TYPE_LOCAL_IMAGE.to_owned(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Skill invocation
    pub fn skill(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: INPUT_TYPE_SKILL.to_owned(),
            name: Some(name.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// `turn/start` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnStartParams {
    pub thread_id: String,
    pub input: Vec<UserInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_policy: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_policy: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<RawJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration_mode: Option<RawJson>,
}

/// Error attached to a turn or an `error` notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnError {
    #[serde(default)]
    pub message: String,
}

/// Turn summary carried by turn notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

/// `turn/started`, `turn/completed` and `turn/failed` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnSummary>,
}

/// `item/completed` params. The item itself is left untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCompletedNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Value>,
}

/// `error` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_retry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

/// Decision that accepts an item-level approval
pub const DECISION_ACCEPT: &str = "accept";
/// Decision that declines an item-level approval
pub const DECISION_DECLINE: &str = "decline";
/// Decision that approves a legacy approval
pub const DECISION_APPROVED: &str = "approved";
/// Decision that denies a legacy approval
pub const DECISION_DENIED: &str = "denied";

/// `item/commandExecution/requestApproval` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandExecutionRequestApprovalParams {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub turn_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `item/fileChange/requestApproval` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeRequestApprovalParams {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub turn_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `item/tool/requestUserInput` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequestUserInputParams {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub turn_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub questions: Vec<Value>,
}

/// `applyPatchApproval` params.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPatchApprovalParams {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub file_changes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_root: Option<String>,
}

/// `execCommandApproval` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommandApprovalParams {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Answer to an approval request: `{"decision": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub decision: String,
}

impl ApprovalResponse {
    /// `{"decision":"accept"}`
    pub fn accept() -> Self {
        Self::decision(DECISION_ACCEPT)
    }

    /// `{"decision":"decline"}`
    pub fn decline() -> Self {
        Self::decision(DECISION_DECLINE)
    }

    /// `{"decision":"approved"}`
    pub fn approved() -> Self {
        Self::decision(DECISION_APPROVED)
    }

    /// `{"decision":"denied"}`
    pub fn denied() -> Self {
        Self::decision(DECISION_DENIED)
    }

    /// Any other decision value
    pub fn decision(decision: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
        }
    }
}

/// Result of `item/commandExecution/requestApproval`
pub type CommandExecutionRequestApprovalResponse = ApprovalResponse;
/// Result of `item/fileChange/requestApproval`
pub type FileChangeRequestApprovalResponse = ApprovalResponse;
/// Result of `applyPatchApproval`
pub type ApplyPatchApprovalResponse = ApprovalResponse;
/// Result of `execCommandApproval`
pub type ExecCommandApprovalResponse = ApprovalResponse;

/// `item/tool/requestUserInput` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequestUserInputResponse {
    /// Answers keyed by question id
    #[serde(default)]
    pub answers: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_params_serialize_empty() {
        assert_eq!(serde_json::to_value(ThreadStartParams::default()).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(ThreadResumeParams::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_turn_start_shape() {
        let params = TurnStartParams {
            thread_id: "thr_123".into(),
            input: vec![UserInput::text("hello")],
            ..TurnStartParams::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"threadId": "thr_123", "input": [{"type": "text", "text": "hello"}]})
        );
    }

    #[test]
    fn test_thread_response_id_fallback() {
        let flat: ThreadResponse = serde_json::from_value(json!({"threadId": "thr_1"})).unwrap();
        assert_eq!(flat.id(), Some("thr_1"));

        let nested: ThreadResponse =
            serde_json::from_value(json!({"thread": {"id": "thr_2", "preview": "x"}})).unwrap();
        assert_eq!(nested.id(), Some("thr_2"));

        let empty: ThreadResponse = serde_json::from_value(json!({"threadId": ""})).unwrap();
        assert_eq!(empty.id(), None);
    }

    #[test]
    fn test_notifications_tolerate_unknown_fields() {
        let note: TurnNotification = serde_json::from_value(json!({
            "threadId": "t",
            "turn": {"id": "turn_1", "status": "failed", "error": {"message": "boom"}, "items": []},
            "extra": 1
        }))
        .unwrap();
        let turn = note.turn.unwrap();
        assert_eq!(turn.status, "failed");
        assert_eq!(turn.error.unwrap().message, "boom");
    }

    #[test]
    fn test_input_constructors() {
        assert_eq!(
            serde_json::to_value(UserInput::skill("lint", "/skills/lint")).unwrap(),
            json!({"type": "skill", "name": "lint", "path": "/skills/lint"})
        );
        assert_eq!(
            serde_json::to_value(UserInput::local_image("/tmp/a.png")).unwrap(),
            json!({"type": "localImage", "path": "/tmp/a.png"})
        );
    }
}
