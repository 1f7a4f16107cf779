//! HTTP transport integration tests.
//!
//! These tests run a minimal HTTP/1.1 server on a random loopback port. It
//! records each request (head and body), answers with a canned status and
//! body, and closes the connection.
//!
//! All test URLs use `127.0.0.1` with an explicit port to avoid DNS lookups.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use controller::{
    ClientConfig, Credentials, DocumentMetadata, DocumentPath, Endpoint, PortalType, RemoteError,
    Value,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use xmlrpc::{connect, decode_call, encode_fault, encode_response};

/// A request as seen by the test server. Header names are lowercased.
#[derive(Debug, Clone)]
struct CapturedRequest {
    head: String,
    body: String,
}

struct TestServer {
    addr: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl TestServer {
    /// Starts a server answering every request with `status_line` and `body`.
    async fn start(status_line: &'static str, body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                captured.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    fn url(&self) -> String {
        format!("http://{}/cps/portal_remote_controller", self.addr)
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request head");
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);

    let body_start = head_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before request body");
        buf.extend_from_slice(&chunk[..n]);
    }

    CapturedRequest {
        head,
        body: String::from_utf8(buf[body_start..body_start + content_length].to_vec()).unwrap(),
    }
}

fn path(s: &str) -> DocumentPath {
    DocumentPath::new(s).unwrap()
}

// ---------------------------------------------------------------------------
// Successful calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_content_over_http() {
    let reply = encode_response(&Value::Array(vec![Value::from("doc1"), Value::from("doc2")]));
    let server = TestServer::start("200 OK", reply).await;
    let client = connect(ClientConfig::from_address(&server.url()).unwrap()).unwrap();

    let entries = client.list_content(&path("workspaces")).await.unwrap();

    assert_eq!(entries, vec![Value::from("doc1"), Value::from("doc2")]);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .head
        .starts_with("post /cps/portal_remote_controller http/1.1"));
    assert!(requests[0].head.contains("content-type: text/xml; charset=utf-8"));
    assert!(!requests[0].head.contains("authorization:"));

    let call = decode_call(&requests[0].body).unwrap();
    assert_eq!(call.method, "listContent");
    assert_eq!(call.params, vec![Value::from("workspaces")]);
}

#[tokio::test]
async fn test_create_document_over_http_keeps_wire_order() {
    let server = TestServer::start(
        "200 OK",
        encode_response(&Value::from("workspaces/test-document")),
    )
    .await;
    let client = connect(ClientConfig::from_address(&server.url()).unwrap()).unwrap();
    let metadata = DocumentMetadata::new()
        .with_text("Title", "Test Document")
        .with_bytes("file", b"Bla bla ...".to_vec());

    let id = client
        .create_document(
            &PortalType::new("File").unwrap(),
            &path("workspaces"),
            metadata.clone(),
            0,
        )
        .await
        .unwrap();

    assert_eq!(id, "workspaces/test-document");
    let call = decode_call(&server.requests()[0].body).unwrap();
    assert_eq!(call.method, "createDocument");
    assert_eq!(
        call.params,
        vec![
            Value::from("File"),
            Value::from(metadata),
            Value::from("workspaces"),
            Value::Int(0),
        ]
    );
}

#[tokio::test]
async fn test_embedded_credentials_sent_as_basic_auth() {
    let server = TestServer::start("200 OK", encode_response(&Value::from("work"))).await;
    let address = server.url().replace("http://", "http://manager:xxx@");
    let client = connect(ClientConfig::from_address(&address).unwrap()).unwrap();

    client
        .get_document_state(&path("workspaces/test-document"))
        .await
        .unwrap();

    let expected = format!(
        "authorization: basic {}",
        BASE64.encode("manager:xxx").to_lowercase()
    );
    assert!(server.requests()[0].head.contains(&expected));
}

#[tokio::test]
async fn test_percent_encoded_credentials_sent_decoded() {
    let server = TestServer::start("200 OK", encode_response(&Value::from("work"))).await;
    let address = server
        .url()
        .replace("http://", "http://manager:p%40ss%20word@");
    let client = connect(ClientConfig::from_address(&address).unwrap()).unwrap();

    client
        .get_document_state(&path("workspaces/test-document"))
        .await
        .unwrap();

    let expected = format!(
        "authorization: basic {}",
        BASE64.encode("manager:p@ss word").to_lowercase()
    );
    assert!(server.requests()[0].head.contains(&expected));
}

#[tokio::test]
async fn test_configured_credentials_and_user_agent() {
    let server = TestServer::start("200 OK", encode_response(&Value::Nil)).await;
    let endpoint = Endpoint::parse(&server.url())
        .unwrap()
        .with_credentials(Credentials::new("admin", "secret"));
    let config = ClientConfig::new(endpoint).with_user_agent("integration-test/1.0");
    let client = connect(config).unwrap();

    let reply = client.unpublish_document(&path("sections/doc1")).await.unwrap();

    assert!(reply.is_nil());
    let head = &server.requests()[0].head;
    assert!(head.contains("user-agent: integration-test/1.0"));
    assert!(head.contains(&format!(
        "authorization: basic {}",
        BASE64.encode("admin:secret").to_lowercase()
    )));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_remote_fault_propagates_unchanged() {
    let server = TestServer::start("200 OK", encode_fault(-1, "KeyError: 'no-such-doc'")).await;
    let client = connect(ClientConfig::from_address(&server.url()).unwrap()).unwrap();

    let err = client
        .get_document_state(&path("workspaces/no-such-doc"))
        .await
        .unwrap_err();

    match err {
        RemoteError::Fault { code, message } => {
            assert_eq!(code, -1);
            assert_eq!(message, "KeyError: 'no-such-doc'");
        }
        other => panic!("expected Fault, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_status_is_protocol_error() {
    let server = TestServer::start("401 Unauthorized", String::new()).await;
    let client = connect(ClientConfig::from_address(&server.url()).unwrap()).unwrap();

    let err = client.list_content(&path("workspaces")).await.unwrap_err();

    match err {
        RemoteError::Protocol { status, reason, url } => {
            assert_eq!(status, 401);
            assert_eq!(reason, "Unauthorized");
            assert_eq!(url, server.url());
        }
        other => panic!("expected Protocol, got {other:?}"),
    }
}

#[tokio::test]
async fn test_html_body_is_malformed_response() {
    let server = TestServer::start("200 OK", "<html><body>Zope</body></html>".into()).await;
    let client = connect(ClientConfig::from_address(&server.url()).unwrap()).unwrap();

    let err = client.list_content(&path("workspaces")).await.unwrap_err();

    assert!(matches!(err, RemoteError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Bind then drop to obtain a loopback port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = connect(
        ClientConfig::from_address(&format!("http://{addr}/cps/portal_remote_controller")).unwrap(),
    )
    .unwrap();

    let err = client.list_content(&path("workspaces")).await.unwrap_err();

    assert!(matches!(err, RemoteError::Transport(_)));
    assert!(err.is_transport());
}

#[test]
fn test_malformed_address_fails_before_any_call() {
    let err = ClientConfig::from_address("myserver.net:8080/cps").unwrap_err();
    assert!(matches!(err, RemoteError::InvalidEndpoint { .. }));
}
