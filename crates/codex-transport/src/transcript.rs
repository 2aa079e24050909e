//! Recorded sessions: an ordered list of lines read from and written to the peer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a transcript line, seen from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Line the client reads from the peer
    Read,
    /// Line the client writes to the peer
    Write,
}

/// One line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Direction of the line
    pub direction: Direction,
    /// The line, without its trailing newline
    pub line: String,
}

impl TranscriptEntry {
    /// A line read from the peer
    pub fn read(line: impl Into<String>) -> Self {
        Self {
            direction: Direction::Read,
            line: line.into(),
        }
    }

    /// A line written to the peer
    pub fn write(line: impl Into<String>) -> Self {
        Self {
            direction: Direction::Write,
            line: line.into(),
        }
    }
}

/// An ordered recording of wire lines.
///
/// Serializes as a JSON array of `{"direction": "read"|"write", "line": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line the client should read
    #[must_use]
    pub fn read(mut self, line: impl Into<String>) -> Self {
        self.entries.push(TranscriptEntry::read(line));
        self
    }

    /// Append a line the client should write
    #[must_use]
    pub fn write(mut self, line: impl Into<String>) -> Self {
        self.entries.push(TranscriptEntry::write(line));
        self
    }

    /// Append a JSON value the client should read
    #[must_use]
    pub fn read_json(self, value: &Value) -> Self {
        self.read(value.to_string())
    }

    /// Append a JSON value the client should write
    #[must_use]
    pub fn write_json(self, value: &Value) -> Self {
        self.write(value.to_string())
    }

    /// Append an entry
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Entries in order
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the JSON array form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Render the JSON array form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<TranscriptEntry>> for Transcript {
    fn from(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<TranscriptEntry> for Transcript {
    fn from_iter<I: IntoIterator<Item = TranscriptEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Transcript {
    type Item = TranscriptEntry;
    type IntoIter = std::vec::IntoIter<TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// True when both lines are textually equal or parse to equal JSON values.
pub fn lines_match(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    let parse = |line: &str| serde_json::from_str::<Value>(line.trim()).ok();
    match (parse(expected), parse(actual)) {
        (Some(e), Some(a)) => e == a,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_form() {
        let transcript = Transcript::new().write(r#"{"method":"initialized"}"#).read("{}");
        let text = serde_json::to_string(&transcript).unwrap();
        assert_eq!(
            text,
            r#"[{"direction":"write","line":"{\"method\":\"initialized\"}"},{"direction":"read","line":"{}"}]"#
        );
        assert_eq!(Transcript::from_json(&text).unwrap(), transcript);
    }

    #[test]
    fn test_lines_match_ignores_key_order() {
        assert!(lines_match(r#"{"a":1,"b":[1,2]}"#, r#"{ "b":[1,2], "a":1 }"#));
        assert!(!lines_match(r#"{"a":1}"#, r#"{"a":2}"#));
        assert!(!lines_match(r#"{"a":1}"#, "not json"));
        assert!(lines_match("not json", "not json"));
    }
}
