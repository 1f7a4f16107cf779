//! XML-RPC over HTTP(S) using `reqwest`.
//!
//! Every call is one `POST` of a `<methodCall>` document to the endpoint URL.
//! Credentials, when configured, travel as HTTP basic authentication on every
//! request. A reply with any status other than `200 OK` is a
//! [`RemoteError::Protocol`]; a `200 OK` carrying a fault is a
//! [`RemoteError::Fault`].

use async_trait::async_trait;
use controller::{ClientConfig, Endpoint, RemoteClient, RemoteError, RpcTransport, Value};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::codec;

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// An [`RpcTransport`] bound to a single remote controller endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpTransport {
    /// Builds the HTTP client for `config`.
    ///
    /// The endpoint was validated when `config` was built, so this only fails
    /// if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| RemoteError::Transport(error_chain(&e)))?;

        tracing::debug!(
            endpoint = %config.endpoint,
            authenticated = config.endpoint.credentials().is_some(),
            "XML-RPC transport ready"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RemoteError> {
        let body = codec::encode_call(method, params);
        tracing::debug!(url = %self.endpoint, method, bytes = body.len(), "Sending XML-RPC request");

        let mut request = self
            .client
            .post(self.endpoint.url().clone())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body);
        if let Some(credentials) = self.endpoint.credentials() {
            request = request.basic_auth(credentials.username(), Some(credentials.password()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(error_chain(&e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RemoteError::Protocol {
                url: self.endpoint.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(error_chain(&e)))?;
        tracing::debug!(method, bytes = bytes.len(), "Received XML-RPC response");

        let text = std::str::from_utf8(&bytes)
            .map_err(|e| RemoteError::MalformedResponse(format!("reply is not UTF-8: {e}")))?;
        codec::decode_response(text)?.into_result()
    }
}

/// Builds a [`RemoteClient`] speaking XML-RPC over HTTP to `config.endpoint`.
pub fn connect(config: ClientConfig) -> Result<RemoteClient<HttpTransport>, RemoteError> {
    HttpTransport::new(config).map(RemoteClient::new)
}

/// Renders an error with its full `source()` chain; `reqwest` keeps the
/// useful part (e.g. "connection refused") in the innermost cause.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
