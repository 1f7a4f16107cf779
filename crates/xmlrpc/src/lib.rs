//! XML-RPC transport adapter for the portal remote controller.
//!
//! Implements the [`controller::RpcTransport`] trait over HTTP(S): a
//! `<methodCall>` document is posted per call and the `<methodResponse>` is
//! decoded back into a [`controller::Value`] or a remote fault.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Wire encoding, HTTP exchange, and basic authentication
//! all live here. The [`controller`] crate sees only
//! [`controller::RpcTransport`].
//!
//! ## Encoding
//!
//! Documents are always UTF-8 (`<?xml version="1.0" encoding="UTF-8"?>`,
//! `Content-Type: text/xml; charset=utf-8`); replies that are not valid UTF-8
//! are rejected as malformed.

pub mod codec;
pub mod error;
pub mod http;

pub use codec::{decode_call, decode_response, encode_call, encode_fault, encode_response};
pub use codec::{MethodCall, MethodResponse};
pub use error::CodecError;
pub use http::{connect, HttpTransport};
