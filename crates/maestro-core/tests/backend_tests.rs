//! Integration tests for the backend client: retry, streaming, fallback,
//! and cancellation, driven by a minimal in-process HTTP responder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use maestro_core::backend::{BackendClient, BackendConfig, GenerateOptions};
use maestro_core::MaestroError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serve canned HTTP responses, one per connection. The response for hit
/// `n` is `responses[min(n, len - 1)]`; the hit counter is returned for
/// attempt assertions.
async fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let hit = hits_in.fetch_add(1, Ordering::SeqCst);
            let response = responses[hit.min(responses.len() - 1)].clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (endpoint, hits)
}

/// Read one HTTP request: headers, then content-length body bytes.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + body_len {
                return;
            }
        }
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn status_500() -> String {
    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        .to_string()
}

fn plain_text(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// SSE response whose declared length exceeds the sent body, so the
/// client sees the connection break mid-stream after the fragment.
fn sse_truncated(fragment: &str) -> String {
    let body = format!(
        "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{fragment}\"}}}}]}}\n\n"
    );
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len() + 64,
        body
    )
}

/// Serve the given response prefix, then hold every connection open
/// without sending anything further.
async fn serve_stalling(prefix: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let prefix = prefix.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let _ = socket.write_all(prefix.as_bytes()).await;
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    endpoint
}

fn sse(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{fragment}\"}}}}]}}\n\n"
        ));
    }
    body.push_str("data: [DONE]\n\n");
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn surfaces_error_after_exactly_three_attempts() {
    let (endpoint, hits) = serve(vec![status_500()]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let error = client
        .generate("hello", GenerateOptions::new())
        .await
        .unwrap_err();
    match error {
        MaestroError::Backend { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn recovers_on_a_later_attempt() {
    let (endpoint, hits) = serve(vec![status_500(), plain_text("All good")]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let generated = client
        .generate("hello", GenerateOptions::new())
        .await
        .unwrap();
    assert_eq!(generated.text, "All good");
    assert!(!generated.degraded);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn plain_text_body_arrives_as_one_fragment() {
    let (endpoint, _) = serve(vec![plain_text("direct answer")]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let fragments = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fragments);
    let options =
        GenerateOptions::new().with_progress(move |s| sink.lock().unwrap().push(s.to_string()));

    let generated = client.generate("hello", options).await.unwrap();
    assert_eq!(generated.text, "direct answer");
    assert_eq!(*fragments.lock().unwrap(), vec!["direct answer"]);
}

#[tokio::test]
async fn sse_fragments_stream_in_order() {
    let (endpoint, _) = serve(vec![sse(&["Hel", "lo", " world"])]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let fragments = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fragments);
    let options =
        GenerateOptions::new().with_progress(move |s| sink.lock().unwrap().push(s.to_string()));

    let generated = client.generate("hello", options).await.unwrap();
    assert_eq!(generated.text, "Hello world");
    assert!(!generated.degraded);
    assert_eq!(*fragments.lock().unwrap(), vec!["Hel", "lo", " world"]);
}

#[tokio::test]
async fn broken_stream_keeps_partial_text_as_degraded() {
    let (endpoint, hits) = serve(vec![sse_truncated("partial answer")]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let generated = client
        .generate("hello", GenerateOptions::new())
        .await
        .unwrap();
    assert!(generated.degraded);
    assert_eq!(generated.text, "partial answer");
    // The partial result is returned, not retried, so the fragments that
    // already reached the caller can never replay.
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stalled_stream_without_any_text_surfaces_timeout() {
    let headers = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: 4096\r\nconnection: close\r\n\r\n";
    let endpoint = serve_stalling(headers.to_string()).await;
    let mut config = BackendConfig::new(endpoint);
    config.chunk_timeout = std::time::Duration::from_secs(1);
    let client = BackendClient::new(config);

    let error = client
        .generate("hello", GenerateOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(error, MaestroError::StreamStalled { seconds: 1 }));
}

#[tokio::test]
async fn stalled_stream_after_a_fragment_keeps_it_as_degraded() {
    let mut response = String::from(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: 4096\r\nconnection: close\r\n\r\n",
    );
    response.push_str("data: {\"choices\":[{\"delta\":{\"content\":\"so far\"}}]}\n\n");
    let endpoint = serve_stalling(response).await;
    let mut config = BackendConfig::new(endpoint);
    config.chunk_timeout = std::time::Duration::from_secs(1);
    let client = BackendClient::new(config);

    let generated = client
        .generate("hello", GenerateOptions::new())
        .await
        .unwrap();
    assert!(generated.degraded);
    assert_eq!(generated.text, "so far");
}

#[tokio::test]
async fn generate_or_simulate_degrades_when_backend_is_unreachable() {
    // Bind and immediately drop to get a port that refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = BackendClient::new(BackendConfig::new(endpoint));
    let generated = client
        .generate_or_simulate("ping", GenerateOptions::new())
        .await
        .unwrap();
    assert!(generated.degraded);
    assert_eq!(generated.text, "You said: ping. (local fallback)");
}

#[tokio::test]
async fn health_check_reflects_backend_state() {
    let (endpoint, _) = serve(vec![plain_text("ok")]).await;
    let healthy = BackendClient::new(BackendConfig::new(endpoint));
    assert!(healthy.health_check().await);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let down = BackendClient::new(BackendConfig::new(endpoint));
    assert!(!down.health_check().await);
}

#[tokio::test]
async fn pre_cancelled_token_aborts_without_retrying() {
    let (endpoint, hits) = serve(vec![plain_text("never seen")]).await;
    let client = BackendClient::new(BackendConfig::new(endpoint));

    let token = CancellationToken::new();
    token.cancel();
    let error = client
        .generate("hello", GenerateOptions::new().with_cancel(token))
        .await
        .unwrap_err();
    assert!(matches!(error, MaestroError::Cancelled));
    // No retries: at most the single aborted connection reaches the server.
    assert!(hits.load(Ordering::SeqCst) <= 1);
}
