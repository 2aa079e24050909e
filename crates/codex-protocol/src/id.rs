//! JSON-RPC request identifiers.
//!
//! A [`RequestId`] is either a string or a 64-bit integer. The "zero" (absent)
//! id is modelled as `Option<RequestId>::None` wherever the wire allows it.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A JSON-RPC request id: a string or an integer, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// String id, e.g. `"req-7"`
    String(String),
    /// Integer id, e.g. `7`
    Number(i64),
}

impl RequestId {
    /// Stable map key that keeps the string and integer domains apart.
    ///
    /// `RequestId::String("1")` and `RequestId::Number(1)` never share a key.
    pub fn key(&self) -> String {
        match self {
            Self::String(s) => format!("s:{s}"),
            Self::Number(n) => format!("i:{n}"),
        }
    }

    /// Returns the integer form, if any.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(_) => None,
        }
    }

    /// Returns the string form, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

struct RequestIdVisitor;

impl Visitor<'_> for RequestIdVisitor {
    type Value = RequestId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer request id")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RequestId, E> {
        Ok(RequestId::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<RequestId, E> {
        Ok(RequestId::String(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<RequestId, E> {
        Ok(RequestId::Number(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<RequestId, E> {
        i64::try_from(value)
            .map(RequestId::Number)
            .map_err(|_| E::custom(format!("invalid request id: {value} is out of range")))
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RequestIdVisitor)
    }
}

/// Decodes an optional id from a JSON value: absent or `null` is the zero id.
///
/// # Errors
///
/// Fails when the value is neither a string nor an integral number.
pub fn parse_request_id(
    value: Option<&serde_json::Value>,
) -> Result<Option<RequestId>, serde_json::Error> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => RequestId::deserialize(v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_number_keys_never_collide() {
        let s = RequestId::from("1");
        let n = RequestId::from(1);
        assert_ne!(s.key(), n.key());
        assert_eq!(s.key(), "s:1");
        assert_eq!(n.key(), "i:1");
    }

    #[test]
    fn test_serializes_as_set_representation() {
        assert_eq!(serde_json::to_value(RequestId::from(42)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(RequestId::from("abc")).unwrap(), json!("abc"));
    }

    #[test]
    fn test_rejects_non_scalar_ids() {
        assert!(serde_json::from_value::<RequestId>(json!(1.5)).is_err());
        assert!(serde_json::from_value::<RequestId>(json!(true)).is_err());
        assert!(serde_json::from_value::<RequestId>(json!({"id": 1})).is_err());
        assert!(serde_json::from_value::<RequestId>(json!([1])).is_err());
    }

    #[test]
    fn test_null_and_missing_are_zero() {
        assert_eq!(parse_request_id(None).unwrap(), None);
        assert_eq!(parse_request_id(Some(&json!(null))).unwrap(), None);
        assert_eq!(
            parse_request_id(Some(&json!("7"))).unwrap(),
            Some(RequestId::String("7".into()))
        );
    }
}
