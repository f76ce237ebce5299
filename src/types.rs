//! Core types shared across the catalog model.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::OlidError;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The three record collections and their OLID suffix letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Work,
    Edition,
    Author,
}

impl RecordKind {
    /// Returns the URL collection segment for this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Work => "works",
            RecordKind::Edition => "books",
            RecordKind::Author => "authors",
        }
    }

    /// Returns the wire `type.key` value for this kind.
    pub fn type_key(&self) -> &'static str {
        match self {
            RecordKind::Work => "/type/work",
            RecordKind::Edition => "/type/edition",
            RecordKind::Author => "/type/author",
        }
    }
}

/// An OL identifier: `OL` prefix, opaque middle, kind suffix (`W`, `M`, `A`).
///
/// Only the prefix and suffix are checked. A suffix-correct identifier with a
/// nonsense middle still routes to the right collection, so a lookup for it
/// reaches the service and surfaces the server's 404 instead of failing
/// locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Olid(String);

impl Olid {
    /// Parse an identifier string.
    ///
    /// # Errors
    ///
    /// Returns `OlidError` when the `OL` prefix or kind suffix is missing.
    pub fn parse(value: impl Into<String>) -> Result<Self, OlidError> {
        let value = value.into();
        let suffix_ok = matches!(value.chars().last(), Some('W' | 'M' | 'A'));
        if value.len() < 3 || !value.starts_with("OL") || !suffix_ok {
            return Err(OlidError { value });
        }
        Ok(Olid(value))
    }

    /// Parse the identifier out of a record key such as `/works/OL123W`.
    pub fn from_key(key: &str) -> Result<Self, OlidError> {
        let segment = key.rsplit('/').next().unwrap_or(key);
        Self::parse(segment)
    }

    /// Scan free text (typically a record URL) for the first OLID-shaped
    /// path segment: `OL`, one or more digits, kind suffix.
    pub fn scan(text: &str) -> Option<Self> {
        text.split(['/', '?', '#', '&'])
            .find(|segment| {
                let digits = segment
                    .strip_prefix("OL")
                    .and_then(|rest| rest.strip_suffix(['W', 'M', 'A']));
                matches!(digits, Some(d) if !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            })
            .map(|segment| Olid(segment.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the record kind encoded in the suffix letter.
    pub fn kind(&self) -> RecordKind {
        match self.0.chars().last() {
            Some('W') => RecordKind::Work,
            Some('M') => RecordKind::Edition,
            _ => RecordKind::Author,
        }
    }

    /// Returns the URL collection segment for this identifier.
    pub fn collection(&self) -> &'static str {
        self.kind().collection()
    }

    /// Returns the wire record key, e.g. `/books/OL123M`.
    pub fn key(&self) -> String {
        format!("/{}/{}", self.collection(), self.0)
    }
}

impl fmt::Display for Olid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Olid {
    type Err = OlidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Olid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Olid::parse(value).map_err(serde::de::Error::custom)
    }
}

/// A free-text field that may arrive as a plain string or as the tagged
/// object `{"type": "/type/text", "value": ...}`.
///
/// In memory it is always the plain string; serialization always re-wraps
/// into the tagged form, whichever shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text(pub String);

impl Text {
    pub const TYPE_KEY: &'static str = "/type/text";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Text {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text(value.to_string())
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text(value)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Text", 2)?;
        state.serialize_field("type", Self::TYPE_KEY)?;
        state.serialize_field("value", &self.0)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Both wire shapes resolve to the same canonical string.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Plain(String),
            Tagged { value: String },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Plain(value) | Wire::Tagged { value } => Text(value),
        })
    }
}

/// The `{"type": "/type/datetime", "value": ...}` timestamp wrapper used by
/// `last_modified` and `created` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedDatetime {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: NaiveDateTime,
}

impl TypedDatetime {
    pub const TYPE_KEY: &'static str = "/type/datetime";

    pub fn new(value: NaiveDateTime) -> Self {
        TypedDatetime {
            kind: Self::TYPE_KEY.to_string(),
            value,
        }
    }
}

/// A stub reference to another record: `{"key": "/authors/OL123A"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

impl KeyRef {
    /// Returns the identifier embedded in the key.
    pub fn olid(&self) -> Result<Olid, OlidError> {
        Olid::from_key(&self.key)
    }
}

impl From<&Olid> for KeyRef {
    fn from(olid: &Olid) -> Self {
        KeyRef { key: olid.key() }
    }
}
