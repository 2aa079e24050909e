//! Pre-serialized JSON values for loosely typed protocol fields.
//!
//! Policies, schemas and effort levels are free-form JSON on the wire. They are
//! carried as [`RawJson`] so the client never re-parses them, and JSON `null` or
//! empty text always means "leave the field out".

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

/// Failure to turn a value into [`RawJson`].
#[derive(Debug, Error)]
pub enum JsonError {
    /// Text was not valid JSON, or the value could not be serialized
    #[error("invalid raw json: {0}")]
    Invalid(#[from] serde_json::Error),

    /// As [`JsonError::Invalid`], for a named field
    #[error("{field}: {source}")]
    Field {
        /// Wire name of the offending field
        field: String,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },
}

/// A validated, already-serialized JSON value.
#[derive(Clone)]
pub struct RawJson(Box<RawValue>);

impl RawJson {
    /// Validate `text` and keep it verbatim. Empty text and `null` yield `None`.
    pub fn parse(text: &str) -> Result<Option<Self>, JsonError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let raw = RawValue::from_string(trimmed.to_owned())?;
        Ok((raw.get() != "null").then_some(Self(raw)))
    }

    /// Serialize `value`. A value that serializes to `null` yields `None`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Option<Self>, JsonError> {
        let raw = serde_json::value::to_raw_value(value)?;
        Ok((raw.get() != "null").then_some(Self(raw)))
    }

    /// The JSON text.
    pub fn get(&self) -> &str {
        self.0.get()
    }

    /// Decode into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.0.get())
    }
}

impl fmt::Debug for RawJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawJson").field(&self.0.get()).finish()
    }
}

impl fmt::Display for RawJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.get())
    }
}

impl PartialEq for RawJson {
    fn eq(&self, other: &Self) -> bool {
        self.0.get() == other.0.get()
    }
}

impl Serialize for RawJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Serialize any value into [`RawJson`]; `null` becomes `None`.
pub fn to_raw_json<T: Serialize + ?Sized>(value: &T) -> Result<Option<RawJson>, JsonError> {
    RawJson::from_serialize(value)
}

/// Normalize an optional field value, labelling failures with the wire name.
pub fn normalize_field<T: Serialize + ?Sized>(
    field: &str,
    value: Option<&T>,
) -> Result<Option<RawJson>, JsonError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match serde_json::value::to_raw_value(value) {
        Ok(raw) => Ok((raw.get() != "null").then_some(RawJson(raw))),
        Err(source) => Err(JsonError::Field {
            field: field.to_owned(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_empty_are_absent() {
        assert!(RawJson::parse("").unwrap().is_none());
        assert!(RawJson::parse("  null ").unwrap().is_none());
        assert!(to_raw_json(&serde_json::Value::Null).unwrap().is_none());
        assert!(normalize_field::<serde_json::Value>("effort", None).unwrap().is_none());
    }

    #[test]
    fn test_raw_text_passes_through() {
        let raw = RawJson::parse(r#"{"type":"object", "properties":{}}"#).unwrap().unwrap();
        assert_eq!(raw.get(), r#"{"type":"object", "properties":{}}"#);
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn test_invalid_text_is_rejected() {
        assert!(RawJson::parse("{nope").is_err());
    }

    #[test]
    fn test_serialized_values() {
        let raw = to_raw_json("never").unwrap().unwrap();
        assert_eq!(raw.get(), r#""never""#);
        let raw = normalize_field("sandbox", Some(&json!({"mode": "read-only"})))
            .unwrap()
            .unwrap();
        assert_eq!(raw.decode::<serde_json::Value>().unwrap(), json!({"mode": "read-only"}));
    }
}
