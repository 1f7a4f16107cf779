//! Error type for every remote controller operation.
//!
//! [`RemoteError`] separates failures reported *by* the remote peer (an
//! XML-RPC fault) from failures to *reach* it (transport, HTTP status) and from
//! local problems (bad address, undecodable reply). Nothing here is retried;
//! errors surface to the caller exactly as produced.

use thiserror::Error;

use crate::ServerName;

/// Errors produced while configuring a client or invoking a remote method.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote peer answered with an XML-RPC fault.
    ///
    /// Produced by: remote-side validation or business-logic failure, such as a
    /// path that does not resolve to a document.
    #[error("Remote fault {code}: {message}")]
    Fault {
        /// `faultCode` member of the fault struct.
        code: i32,
        /// `faultString` member of the fault struct.
        message: String,
    },

    /// The HTTP exchange completed with a status other than `200 OK`.
    #[error("HTTP {status} from {url}: {reason}")]
    Protocol {
        /// Endpoint URL (credentials stripped).
        url: String,
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, or empty when unknown.
        reason: String,
    },

    /// The request could not be delivered or the reply could not be read.
    ///
    /// Produced by: unreachable host, refused connection, TLS failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The configured server address is malformed or uses an unsupported scheme.
    ///
    /// Produced at construction time; no call is ever attempted.
    #[error("Invalid endpoint '{address}': {reason}")]
    InvalidEndpoint {
        /// The rejected address, with any password masked.
        address: String,
        /// Why the address was rejected.
        reason: String,
    },

    /// The reply body was not a well-formed XML-RPC response.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The reply decoded correctly but does not match the method's return contract.
    #[error("Unexpected result from '{method}': expected {expected}, got {actual}")]
    UnexpectedResult {
        /// Remote method name.
        method: String,
        /// XML-RPC type the wrapper expected.
        expected: &'static str,
        /// XML-RPC type actually received.
        actual: &'static str,
    },

    /// A server registry lookup named a server that is not registered.
    #[error("No such server: {0}")]
    UnknownServer(ServerName),

    /// A server registry has no entries to choose from.
    #[error("No servers configured")]
    NoServers,
}

impl RemoteError {
    /// Returns `true` if the remote peer itself rejected the call.
    pub fn is_fault(&self) -> bool {
        matches!(self, RemoteError::Fault { .. })
    }

    /// Returns `true` if the call failed before a valid XML-RPC reply was received.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport(_) | RemoteError::Protocol { .. } | RemoteError::MalformedResponse(_)
        )
    }
}
