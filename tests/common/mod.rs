//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use edge_forwarder::config::ForwarderConfig;
use edge_forwarder::logging::{LogAdapter, LogSink, MemorySink};
use edge_forwarder::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    /// Lower-cased header names.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SeenRequest {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` receives each request and returns the status, extra headers and body
/// to answer with. Every request is also published on the returned channel.
pub async fn start_programmable_backend<F, Fut>(
    f: F,
) -> (SocketAddr, mpsc::UnboundedReceiver<SeenRequest>)
where
    F: Fn(SeenRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(String, String)>, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen_tx = seen_tx.clone();
                    tokio::spawn(async move {
                        let Some(seen) = read_request(&mut socket).await else {
                            return;
                        };
                        let _ = seen_tx.send(seen.clone());
                        let (status, headers, body) = f(seen).await;

                        let mut response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status,
                            reason(status),
                            body.len()
                        );
                        for (name, value) in headers {
                            response.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response.push_str("\r\n");
                        response.push_str(&body);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen_rx)
}

/// Start a mock backend that always answers with `status` and `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(
    status: u16,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<SeenRequest>) {
    start_programmable_backend(move |_| async move {
        (
            status,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            body.to_string(),
        )
    })
    .await
}

/// Start a backend that promises a longer body than it sends, then hangs up.
#[allow(dead_code)]
pub async fn start_truncating_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_none() {
                    return;
                }
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello")
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A server wired to in-memory sinks.
#[allow(dead_code)]
pub struct TestForwarder {
    pub server: HttpServer,
    pub remote: Arc<MemorySink>,
    pub console: Arc<MemorySink>,
}

#[allow(dead_code)]
pub fn forwarder_for(backend_url: &str, version: Option<&str>) -> TestForwarder {
    let mut config = ForwarderConfig::default();
    config.backend.url = backend_url.to_string();
    config.service.version = version.map(str::to_string);

    let remote = Arc::new(MemorySink::new());
    let console = Arc::new(MemorySink::new());
    let logger = LogAdapter::new(remote.clone(), Some(console.clone() as Arc<dyn LogSink>));
    let server = HttpServer::new(config, logger).unwrap();

    TestForwarder {
        server,
        remote,
        console,
    }
}

#[allow(dead_code)]
pub fn post(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("Host", "edge.test")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_request(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).into_owned();

    Some(SeenRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
