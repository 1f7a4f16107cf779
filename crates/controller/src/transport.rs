//! The port through which [`crate::RemoteClient`] reaches a remote controller.
//!
//! Infrastructure crates implement [`RpcTransport`]; this crate never opens a
//! socket itself. Tests substitute a recording stub.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{RemoteError, Value};

/// Issues one remote procedure call and waits for its single reply.
///
/// A call is a method name plus an ordered parameter list. Implementations
/// must send the parameters in exactly the order given and must surface a
/// remote fault as [`RemoteError::Fault`] without reinterpreting it.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Sends `method` with `params` and returns the decoded reply value.
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RemoteError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RemoteError> {
        (**self).call(method, params).await
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RemoteError> {
        (**self).call(method, params).await
    }
}
