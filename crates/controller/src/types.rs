//! Shared value types for the remote controller domain.
//!
//! [`Value`] is the XML-RPC data model: every call parameter and every remote
//! result is one of its variants. [`DocumentMetadata`] is the caller-supplied
//! field map sent with `createDocument` and `editDocument`.
//!
//! Neither type validates content against a schema; the remote peer is the
//! only authority on which fields a portal type accepts.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::ser::{Serialize, Serializer};

/// `strftime` layout of the XML-RPC `dateTime.iso8601` type (`19980717T14:08:55`).
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Wire values
// ---------------------------------------------------------------------------

/// A single XML-RPC value.
///
/// Struct members are kept in a [`BTreeMap`] so encoded requests are
/// deterministic; XML-RPC itself attaches no meaning to member order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>` / `<i4>`: a signed 32-bit integer.
    Int(i32),
    /// `<boolean>`: encoded as `0` or `1`.
    Boolean(bool),
    /// `<string>`, or untyped text directly inside `<value>`.
    String(String),
    /// `<double>`.
    Double(f64),
    /// `<dateTime.iso8601>`: a timezone-less timestamp.
    DateTime(NaiveDateTime),
    /// `<base64>`: raw bytes, e.g. uploaded file content.
    Base64(Vec<u8>),
    /// `<struct>`: named members.
    Struct(BTreeMap<String, Value>),
    /// `<array>`: an ordered sequence.
    Array(Vec<Value>),
    /// `<nil/>`: the common extension used by servers returning `None`.
    Nil,
}

impl Value {
    /// Returns the XML-RPC type name of this value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Base64(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Unwraps a string, handing the value back unchanged on mismatch.
    pub fn into_string(self) -> Result<String, Value> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other),
        }
    }

    /// Unwraps an array, handing the value back unchanged on mismatch.
    pub fn into_array(self) -> Result<Vec<Value>, Value> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other),
        }
    }

    /// Unwraps a struct, handing the value back unchanged on mismatch.
    pub fn into_struct(self) -> Result<BTreeMap<String, Value>, Value> {
        match self {
            Value::Struct(members) => Ok(members),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
            Value::Base64(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Struct(members) => {
                write!(f, "{{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                write!(f, "}}")
            }
            Value::Array(items) => write!(f, "{}", Params(items)),
            Value::Nil => write!(f, "nil"),
        }
    }
}

/// Serialises to the natural JSON shape: bytes become a base64 string and
/// timestamps their `dateTime.iso8601` text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i32(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::DateTime(dt) => serializer.collect_str(&dt.format(DATE_TIME_FORMAT)),
            Value::Base64(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            Value::Struct(members) => serializer.collect_map(members),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Nil => serializer.serialize_unit(),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(members: BTreeMap<String, Value>) -> Self {
        Value::Struct(members)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

/// Display adapter for an ordered parameter list: `[a, b, c]`.
pub struct Params<'a>(pub &'a [Value]);

impl std::fmt::Display for Params<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

// ---------------------------------------------------------------------------
// Document metadata
// ---------------------------------------------------------------------------

/// Field map describing a document to create or edit.
///
/// Values are text or raw byte content (sent as `<base64>`), though any
/// [`Value`] is accepted. Encoded on the wire as a single `<struct>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata(BTreeMap<String, Value>);

impl DocumentMetadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field, replacing any previous value.
    #[must_use]
    pub fn with_text(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(field.into(), Value::String(text.into()));
        self
    }

    /// Adds a byte-content field, replacing any previous value.
    #[must_use]
    pub fn with_bytes(mut self, field: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.0.insert(field.into(), Value::Base64(bytes.into()));
        self
    }

    /// Inserts an arbitrary value, returning the previous one if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<DocumentMetadata> for Value {
    fn from(metadata: DocumentMetadata) -> Self {
        Value::Struct(metadata.0)
    }
}

impl FromIterator<(String, Value)> for DocumentMetadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
