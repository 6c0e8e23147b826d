//! `GeminiRestClient` against a local one-shot HTTP stub: request shape,
//! status mapping, reply extraction and the resolver wired on top.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use smartcity_advisor::clients::{BackendError, GeminiRestClient, GenerativeBackend};
use smartcity_advisor::{
    CredentialHolder, Domain, ExternalAttempt, RecommendationResolver, ResolutionSource,
    ResolveRequest,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const KEY: &str = "SECRET";

/// Accept one connection, answer it with `status_line` and `body`, and hand
/// back the raw request text.
async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn client(base_url: &str) -> GeminiRestClient {
    GeminiRestClient::new(base_url, "gemini-pro", Duration::from_secs(5)).unwrap()
}

fn reply_with_text(text: &str) -> String {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn forbidden_status_maps_to_status_error() {
    let (base_url, server) = serve_once("403 Forbidden", r#"{"error":"bad key"}"#.into()).await;

    let result = client(&base_url).generate(KEY, "hello").await;

    match result {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("bad key"), "{body}");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap_or_default();
    assert_eq!(
        request_line,
        "POST /models/gemini-pro:generateContent?key=SECRET HTTP/1.1"
    );
    assert!(request.contains(r#"{"contents":[{"parts":[{"text":"hello"}]}]}"#));
}

#[tokio::test]
async fn fenced_reply_resolves_as_external() {
    let text = "```json\n{\"recommendations\": [\"Stagger elevator banks.\", \"Pre-cool lobby.\"], \"impact\": \"Medium\", \"savings\": \"7%\"}\n```";
    let (base_url, server) = serve_once("200 OK", reply_with_text(text)).await;

    let holder = Arc::new(CredentialHolder::in_memory());
    holder.set_credential(KEY).unwrap();
    let resolver = RecommendationResolver::new(holder).with_backend(Arc::new(client(&base_url)));

    let resolution = resolver
        .resolve_detailed(&ResolveRequest::new(
            Domain::Energy,
            "Building: Skyline Tower, Range: Daily, Load: 4480kW",
        ))
        .await;

    assert_eq!(resolution.source, ResolutionSource::External);
    assert_eq!(resolution.external, ExternalAttempt::Succeeded);
    assert_eq!(resolution.recommendation.savings_label, "7%");
    assert_eq!(resolution.recommendation.actions.len(), 2);

    let request = server.await.unwrap();
    assert!(request.lines().next().unwrap_or_default().contains("?key=SECRET"));
    assert!(request.contains("Context: energy."));
}

#[tokio::test]
async fn empty_candidates_is_malformed() {
    let (base_url, server) = serve_once("200 OK", r#"{"candidates":[]}"#.into()).await;

    let result = client(&base_url).generate(KEY, "hello").await;

    assert!(
        matches!(result, Err(BackendError::MalformedResponse(_))),
        "{result:?}"
    );
    server.await.unwrap();
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (base_url, server) = serve_once("200 OK", "<html>maintenance</html>".into()).await;

    let result = client(&base_url).generate(KEY, "hello").await;

    assert!(
        matches!(result, Err(BackendError::MalformedResponse(_))),
        "{result:?}"
    );
    server.await.unwrap();
}

#[tokio::test]
async fn connection_failure_does_not_leak_key() {
    // Grab a free port, then close it so the connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{addr}")).generate(KEY, "hello").await;

    match result {
        Err(BackendError::Transport(message)) => {
            assert!(!message.contains(KEY), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}
