//! Newtype domain identifiers.
//!
//! Every remote-controller concept that is addressed by name is represented as
//! a distinct newtype wrapping a `String`, so a [`PortalType`] cannot be
//! passed where a [`DocumentPath`] is expected. `createDocument` takes both
//! as adjacent string parameters.

use serde::{Deserialize, Serialize};

use crate::Value;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display,
// a checked TryFrom<String> used by Deserialize, and a conversion into a
// wire `Value::String`.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
                    .ok_or_else(|| concat!(stringify!($name), " must not be empty").to_owned())
            }
        }

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&$name> for Value {
            fn from(id: &$name) -> Self {
                Value::String(id.0.clone())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: portal content
// ---------------------------------------------------------------------------

string_id! {
    /// A document or folder path relative to the portal root.
    ///
    /// Of the form `"workspaces"`, `"workspaces/folder1"` or
    /// `"sections/doc2"`. The remote side resolves it; no local check beyond
    /// non-emptiness is made.
    DocumentPath
}

string_id! {
    /// The portal type of a document to create (e.g. `"File"`, `"News Item"`).
    PortalType
}

string_id! {
    /// A portal member login, as used by the role queries.
    Username
}

string_id! {
    /// A permission name checked on the remote side (e.g. `"View"`).
    Permission
}

// ---------------------------------------------------------------------------
// Identifiers: local configuration
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a server entry in a [`crate::ServerRegistry`].
    ///
    /// Purely local: the name is never sent over the wire.
    ServerName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identifier_is_rejected() {
        assert!(DocumentPath::new("").is_none());
        assert!(PortalType::new(String::new()).is_none());
    }

    #[test]
    fn test_identifier_round_trips_text() {
        let path = DocumentPath::new("workspaces/folder1").unwrap();
        assert_eq!(path.as_str(), "workspaces/folder1");
        assert_eq!(path.to_string(), "workspaces/folder1");
    }

    #[test]
    fn test_identifier_becomes_wire_string() {
        let kind = PortalType::new("News Item").unwrap();
        assert_eq!(Value::from(&kind), Value::String("News Item".into()));
    }

    #[test]
    fn test_deserialize_rejects_empty_identifier() {
        let path: DocumentPath = serde_json::from_str(r#""sections/doc2""#).unwrap();
        assert_eq!(path.as_str(), "sections/doc2");

        let err = serde_json::from_str::<PortalType>("\"\"").unwrap_err();
        assert!(err.to_string().contains("PortalType must not be empty"));
    }

    #[test]
    fn test_server_names_order_lexically() {
        let a = ServerName::new("server1").unwrap();
        let b = ServerName::new("server2").unwrap();
        assert!(a < b);
    }
}
