//! Shared utilities for integration testing.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use deploy_gateway::config::GatewayConfig;
use deploy_gateway::http::HttpServer;
use deploy_gateway::lifecycle::Shutdown;

/// A request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What a programmable backend answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            content_type: Some("application/json"),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn text(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            content_type: Some("text/plain; charset=utf-8"),
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    /// Gzip the body and label it `Content-Encoding: gzip`.
    pub fn gzipped(mut self) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body).unwrap();
        self.body = encoder.finish().unwrap();
        self.headers.push(("Content-Encoding", "gzip"));
        self
    }
}

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    hits_at: Arc<Mutex<Vec<Instant>>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            hits_at: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of connections accepted.
    pub fn hits(&self) -> usize {
        self.hits_at.lock().unwrap().len()
    }

    pub fn first_hit(&self) -> Option<Instant> {
        self.hits_at.lock().unwrap().first().copied()
    }

    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record_hit(&self) {
        self.hits_at.lock().unwrap().push(Instant::now());
    }
}

async fn bind_local() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Read one HTTP/1.1 request (headers plus a Content-Length body).
async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}

/// Start a programmable backend that answers every request via `respond`.
pub async fn start_backend<F>(respond: F) -> MockBackend
where
    F: Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static,
{
    let (listener, addr) = bind_local().await;
    let backend = MockBackend::new(addr);
    let handle = backend.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            handle.record_hit();
            let handle = handle.clone();
            let respond = respond.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let response = respond(&request);
                let is_head = request.method == "HEAD";
                handle.requests.lock().unwrap().push(request);

                let mut head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    response.reason,
                    response.body.len()
                );
                if let Some(ct) = response.content_type {
                    head.push_str(&format!("Content-Type: {}\r\n", ct));
                }
                for (name, value) in &response.headers {
                    head.push_str(&format!("{}: {}\r\n", name, value));
                }
                head.push_str("\r\n");

                let mut raw = head.into_bytes();
                if !is_head {
                    raw.extend_from_slice(&response.body);
                }
                let _ = socket.write_all(&raw).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    backend
}

/// Start a backend that accepts connections and never answers.
pub async fn start_stalling_backend() -> MockBackend {
    let (listener, addr) = bind_local().await;
    let backend = MockBackend::new(addr);
    let handle = backend.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            handle.record_hit();
            tokio::spawn(async move {
                let _socket = socket;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            });
        }
    });

    backend
}

/// Start a backend that accepts connections and closes them immediately.
pub async fn start_closing_backend() -> MockBackend {
    let (listener, addr) = bind_local().await;
    let backend = MockBackend::new(addr);
    let handle = backend.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            handle.record_hit();
            drop(socket);
        }
    });

    backend
}

/// Handle to a backend that emits an endless event stream.
pub struct StreamingBackend {
    pub backend: MockBackend,
    /// Receives once per connection when a write to the client fails.
    pub disconnected: mpsc::UnboundedReceiver<()>,
}

/// Start a backend that answers with a chunked `data: line N` event every
/// 100ms until the peer goes away.
pub async fn start_streaming_backend() -> StreamingBackend {
    let (listener, addr) = bind_local().await;
    let backend = MockBackend::new(addr);
    let handle = backend.clone();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            handle.record_hit();
            let handle = handle.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                handle.requests.lock().unwrap().push(request);

                let head = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/event-stream; charset=utf-8\r\n\
                    Cache-Control: max-age=60\r\n\
                    Transfer-Encoding: chunked\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    let _ = tx.send(());
                    return;
                }

                for i in 0..600 {
                    let event = format!("data: line {}\n\n", i);
                    let chunk = format!("{:x}\r\n{}\r\n", event.len(), event);
                    if socket.write_all(chunk.as_bytes()).await.is_err() {
                        let _ = tx.send(());
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
            });
        }
    });

    StreamingBackend {
        backend,
        disconnected: rx,
    }
}

/// An address nothing listens on; connecting to it is refused.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Gateway config with exactly `candidates`, in order.
pub fn gateway_config(candidates: &[String], request_secs: u64) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backend.url = None;
    config.backend.fallback_urls = candidates.to_vec();
    config.timeouts.request_secs = request_secs;
    config.observability.metrics_enabled = false;
    config
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let (listener, addr) = bind_local().await;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway { addr, shutdown }
}

/// Client without connection reuse, so every request opens a new connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
