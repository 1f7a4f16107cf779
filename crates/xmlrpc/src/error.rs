//! Error types for the XML-RPC codec.

use controller::RemoteError;
use thiserror::Error;

/// Errors that can occur while decoding an XML-RPC document.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid UTF-8 in document: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("Unknown value type <{0}>")]
    UnknownType(String),

    #[error("Invalid <{kind}> content '{content}'")]
    InvalidScalar { kind: String, content: String },

    #[error("Fault struct lacks a valid {0}")]
    InvalidFault(&'static str),
}

impl From<CodecError> for RemoteError {
    fn from(err: CodecError) -> Self {
        RemoteError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
