//! Client-side domain for the portal remote controller.
//!
//! This crate contains the XML-RPC value model, the newtype identifiers used
//! in remote calls, endpoint and credential configuration, the error type, and
//! the [`RemoteClient`] that maps each remote method to its fixed parameter
//! layout. Transports implement [`RpcTransport`]; this crate never performs
//! I/O itself.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** The `xmlrpc` crate supplies the wire codec
//! and the HTTP transport; the `cli` crate wires them together.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`DocumentPath`, `PortalType`, `ServerName`, etc.) |
//! | [`types`] | The wire [`Value`] model and [`DocumentMetadata`] |
//! | [`errors`] | [`RemoteError`] |
//! | [`endpoint`] | [`Endpoint`], [`Credentials`], [`ClientConfig`] |
//! | [`transport`] | The [`RpcTransport`] port |
//! | [`client`] | [`RemoteClient`] typed wrappers |
//! | [`registry`] | [`ServerRegistry`] for multi-server setups |

pub mod client;
pub mod endpoint;
pub mod errors;
pub mod identifiers;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::{method, RemoteClient, DEFAULT_POSITION};
pub use endpoint::{ClientConfig, Credentials, Endpoint, DEFAULT_USER_AGENT, TOOL_ID};
pub use errors::RemoteError;
pub use identifiers::{DocumentPath, Permission, PortalType, ServerName, Username};
pub use registry::ServerRegistry;
pub use transport::RpcTransport;
pub use types::{DocumentMetadata, Params, Value, DATE_TIME_FORMAT};
