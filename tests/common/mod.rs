//! Shared utilities for integration testing.
//!
//! The mock backend owns its own runtime, so blocking client calls can be
//! made from plain `#[test]` functions.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;

/// What the backend does with the n-th request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond immediately.
    Respond { status: u16, body: String },
    /// Accept, read the request, then say nothing for this long.
    Stall(Duration),
    /// Send the head and the first `sent` body bytes, then go quiet.
    Dribble {
        body: String,
        sent: usize,
        stall: Duration,
    },
    /// Accept, read the request, then close without responding.
    Hangup,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Reply::Respond {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: body.to_string(),
        }
    }
}

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub struct MockBackend {
    addr: SocketAddr,
    hits: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    runtime: Option<Runtime>,
}

impl MockBackend {
    /// Start a backend that answers every request the same way.
    pub fn fixed(reply: Reply) -> Self {
        Self::programmable(move |_| reply.clone())
    }

    /// Start a backend whose reply depends on the 1-based request number.
    pub fn programmable<F>(f: F) -> Self
    where
        F: Fn(u32) -> Reply + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        std_listener.set_nonblocking(true).unwrap();
        let addr = std_listener.local_addr().unwrap();

        let hits = Arc::new(AtomicU32::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let f = Arc::new(f);

        let (accept_hits, accept_requests) = (hits.clone(), requests.clone());
        runtime.spawn(async move {
            let listener = TcpListener::from_std(std_listener).unwrap();
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let f = f.clone();
                        let hits = accept_hits.clone();
                        let requests = accept_requests.clone();
                        tokio::spawn(async move {
                            serve(socket, f, hits, requests).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            addr,
            hits,
            requests,
            runtime: Some(runtime),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn serve<F>(
    mut socket: TcpStream,
    f: Arc<F>,
    hits: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) where
    F: Fn(u32) -> Reply + Send + Sync + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    requests.lock().unwrap().push(request);
    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;

    match f(n) {
        Reply::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Stall(duration) => {
            tokio::time::sleep(duration).await;
        }
        Reply::Dribble { body, sent, stall } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body.as_bytes()[..sent.min(body.len())]).await;
            let _ = socket.flush().await;
            tokio::time::sleep(stall).await;
        }
        Reply::Hangup => {}
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).into_owned();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// An address nothing is listening on.
pub fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
