//! # JSON-RPC line shapes
//!
//! The app-server speaks newline-delimited JSON-RPC without the `"jsonrpc"`
//! version member. Four shapes exist on the wire:
//!
//! | shape        | `id` | `method` | `result` | `error` |
//! |--------------|------|----------|----------|---------|
//! | request      | yes  | yes      |          |         |
//! | notification |      | yes      |          |         |
//! | response     | yes  |          | yes      |         |
//! | error        | yes  |          |          | yes     |
//!
//! [`parse_line`] classifies a raw line by looking only at which of these
//! top-level members are present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::id::{RequestId, parse_request_id};

/// Parse error (-32700)
pub const PARSE_ERROR: i64 = -32700;
/// Invalid request (-32600)
pub const INVALID_REQUEST: i64 = -32600;
/// Method not found (-32601)
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid params (-32602)
pub const INVALID_PARAMS: i64 = -32602;
/// Internal error (-32603)
pub const INTERNAL_ERROR: i64 = -32603;

/// A request with an id, expecting exactly one response or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Request identifier
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a request
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A fire-and-forget message without an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Id of the request being answered; `None` serializes as `null`
    pub id: Option<RequestId>,
    /// Result payload
    pub result: Value,
}

impl JsonRpcResponse {
    /// Create a response for `id`
    pub fn new(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: Some(id.into()),
            result,
        }
    }
}

/// An error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    /// Id of the request being answered
    pub id: Option<RequestId>,
    /// Error payload
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    /// Create an error response for `id`
    pub fn new(id: impl Into<RequestId>, error: JsonRpcError) -> Self {
        Self {
            id: Some(id.into()),
            error,
        }
    }
}

/// The `error` member of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("json-rpc error {code}: {message}")]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach additional data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, details)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, details)
    }
}

/// A classified inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Server-initiated request
    Request(JsonRpcRequest),
    /// Server notification
    Notification(JsonRpcNotification),
    /// Response to one of our requests
    Response(JsonRpcResponse),
    /// Error response to one of our requests
    Error(JsonRpcErrorResponse),
}

impl Message {
    /// Method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) | Self::Error(_) => None,
        }
    }
}

/// Failure to classify a line. Never fatal to a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The line is not valid JSON
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Valid JSON matching none of the four shapes
    #[error("unrecognized json-rpc message")]
    Unrecognized,

    /// `method` is present but not a string
    #[error("invalid method: expected a string")]
    InvalidMethod,

    /// `id` is neither a string nor an integer
    #[error("invalid request id: {0}")]
    InvalidId(#[source] serde_json::Error),

    /// `error` does not have the `{code, message, data?}` shape
    #[error("invalid error object: {0}")]
    InvalidError(#[source] serde_json::Error),
}

/// Classify one raw line into a [`Message`].
///
/// # Errors
///
/// Returns [`ParseError`] for invalid JSON, a malformed id or error object, or
/// a payload with none of the recognised shapes.
pub fn parse_line(line: &str) -> Result<Message, ParseError> {
    let value: Value = serde_json::from_str(line.trim()).map_err(ParseError::InvalidJson)?;
    let Value::Object(mut obj) = value else {
        return Err(ParseError::Unrecognized);
    };

    let method = match obj.remove("method") {
        None | Some(Value::Null) => None,
        Some(Value::String(m)) if m.is_empty() => None,
        Some(Value::String(m)) => Some(m),
        Some(_) => return Err(ParseError::InvalidMethod),
    };
    let id = parse_request_id(obj.get("id")).map_err(ParseError::InvalidId)?;

    if let Some(method) = method {
        let params = take_non_null(&mut obj, "params");
        return Ok(match id {
            Some(id) => Message::Request(JsonRpcRequest { id, method, params }),
            None => Message::Notification(JsonRpcNotification { method, params }),
        });
    }

    if let Some(result) = obj.remove("result") {
        return Ok(Message::Response(JsonRpcResponse { id, result }));
    }

    if let Some(error) = take_non_null(&mut obj, "error") {
        let error = JsonRpcError::deserialize(error).map_err(ParseError::InvalidError)?;
        return Ok(Message::Error(JsonRpcErrorResponse { id, error }));
    }

    Err(ParseError::Unrecognized)
}

fn take_non_null(obj: &mut Map<String, Value>, key: &str) -> Option<Value> {
    obj.remove(key).filter(|v| !v.is_null())
}

/// Serialize params, mapping JSON `null` to "absent" so it is omitted on the wire.
///
/// # Errors
///
/// Propagates the serializer error for values JSON cannot represent.
pub fn encode_params<P: Serialize + ?Sized>(
    params: &P,
) -> Result<Option<Value>, serde_json::Error> {
    let value = serde_json::to_value(params)?;
    Ok((!value.is_null()).then_some(value))
}

/// Serialize a wire message into a single line without the trailing newline.
///
/// # Errors
///
/// Propagates the serializer error.
pub fn encode_line<T: Serialize + ?Sized>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_classifies_all_four_shapes() {
        assert!(matches!(
            parse_line(r#"{"id":1,"method":"applyPatchApproval","params":{}}"#).unwrap(),
            Message::Request(_)
        ));
        assert!(matches!(
            parse_line(r#"{"method":"turn/started","params":{"threadId":"t"}}"#).unwrap(),
            Message::Notification(_)
        ));
        assert!(matches!(
            parse_line(r#"{"id":"a","result":{}}"#).unwrap(),
            Message::Response(_)
        ));
        assert!(matches!(
            parse_line(r#"{"id":2,"error":{"code":-1,"message":"boom"}}"#).unwrap(),
            Message::Error(_)
        ));
    }

    #[test]
    fn test_null_result_is_still_a_response() {
        let msg = parse_line(r#"{"id":3,"result":null}"#).unwrap();
        assert_eq!(
            msg,
            Message::Response(JsonRpcResponse {
                id: Some(RequestId::Number(3)),
                result: Value::Null,
            })
        );
    }

    #[test]
    fn test_jsonrpc_member_is_ignored() {
        let msg = parse_line(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
        assert_eq!(msg, Message::Notification(JsonRpcNotification::new("initialized", None)));
    }

    #[test]
    fn test_unrecognized_payloads() {
        assert!(matches!(parse_line(r#"{"foo":1}"#), Err(ParseError::Unrecognized)));
        assert!(matches!(parse_line("[1,2]"), Err(ParseError::Unrecognized)));
        assert!(matches!(parse_line("42"), Err(ParseError::Unrecognized)));
        assert!(matches!(parse_line("not json"), Err(ParseError::InvalidJson(_))));
        assert!(matches!(
            parse_line(r#"{"id":true,"result":{}}"#),
            Err(ParseError::InvalidId(_))
        ));
        assert!(matches!(
            parse_line(r#"{"id":1,"error":"boom"}"#),
            Err(ParseError::InvalidError(_))
        ));
    }

    #[test]
    fn test_request_line_omits_absent_params() {
        let line = encode_line(&JsonRpcNotification::new("initialized", None)).unwrap();
        assert_eq!(line, r#"{"method":"initialized"}"#);

        let req = JsonRpcRequest::new(1, "ping", encode_params(&json!({"a": 1})).unwrap());
        let value: Value = serde_json::from_str(&encode_line(&req).unwrap()).unwrap();
        assert_eq!(value, json!({"id": 1, "method": "ping", "params": {"a": 1}}));
    }

    #[test]
    fn test_error_display_carries_code_and_message() {
        let err = JsonRpcError::new(-5, "nope");
        assert_eq!(err.to_string(), "json-rpc error -5: nope");
    }

    #[test]
    fn test_encode_params_drops_null() {
        assert_eq!(encode_params(&()).unwrap(), None);
        assert_eq!(encode_params(&Option::<u8>::None).unwrap(), None);
        assert_eq!(encode_params(&json!({})).unwrap(), Some(json!({})));
    }
}
