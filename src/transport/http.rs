//! Default HTTP/1.1 transport.
//!
//! # Responsibilities
//! - Open one TCP connection per call under the connect timeout
//! - Send the request over a hyper HTTP/1.1 connection
//! - Buffer the response, bounding every wait for bytes by the read timeout
//!
//! # Design Decisions
//! - Plain HTTP only; HTTPS endpoints need a caller-supplied transport
//! - No connection pooling: each call sends `Connection: close`
//! - Read timeout is an idle limit (head, then each body frame), like a socket read timeout
//! - IP literals connect directly; host names are resolved on tokio's blocking pool

use std::future::poll_fn;
use std::pin::pin;

use axum::body::Body;
use futures_util::future::{BoxFuture, FutureExt};
use hyper::body::{Body as HttpBody, Bytes};
use hyper::client::conn::http1;
use hyper::header::{HeaderValue, CONNECTION, HOST};
use hyper::{Request, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::error::{ClientError, ClientResult};
use crate::resilience::timeouts::{connect_within, read_within};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportTimeouts};

/// Hyper-based transport used when no override is configured.
#[derive(Debug, Clone, Default)]
pub struct HyperTransport;

impl HyperTransport {
    pub fn new() -> Self {
        Self
    }

    async fn exchange(&self, request: HttpRequest, timeouts: TransportTimeouts) -> ClientResult<HttpResponse> {
        let (parts, body) = request.into_parts();
        let target = Target::from_uri(&parts.uri)?;

        let stream = connect_within(timeouts.connect, &target.address, TcpStream::connect(&target.address)).await?;
        let (mut sender, connection) = http1::handshake::<_, Body>(TokioIo::new(stream))
            .await
            .map_err(|e| ClientError::Transport(Box::new(e)))?;

        let address = target.address.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(address = %address, error = %e, "Connection closed with error");
            }
        });

        let mut outbound = Request::from_parts(parts, Body::from(body));
        *outbound.uri_mut() = target.origin_form;
        let headers = outbound.headers_mut();
        headers.entry(HOST).or_insert(target.host_header);
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let response = read_within(timeouts.read, sender.send_request(outbound))
            .await?
            .map_err(|e| ClientError::Transport(Box::new(e)))?;

        let (head, incoming) = response.into_parts();
        let mut incoming = pin!(incoming);
        let mut buffer = Vec::new();
        loop {
            let frame = read_within(timeouts.read, poll_fn(|cx| incoming.as_mut().poll_frame(cx))).await?;
            match frame {
                None => break,
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        buffer.extend_from_slice(&data);
                    }
                }
                Some(Err(e)) => return Err(ClientError::Transport(Box::new(e))),
            }
        }

        Ok(HttpResponse::from_parts(head, Bytes::from(buffer)))
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: HttpRequest, timeouts: TransportTimeouts) -> BoxFuture<'_, ClientResult<HttpResponse>> {
        self.exchange(request, timeouts).boxed()
    }

    fn enforces_timeouts(&self) -> bool {
        true
    }
}

/// Where a request goes, derived from its absolute URI.
#[derive(Debug)]
struct Target {
    address: String,
    host_header: HeaderValue,
    origin_form: Uri,
}

impl Target {
    fn from_uri(uri: &Uri) -> ClientResult<Self> {
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(ClientError::UnsupportedScheme(other.to_string())),
            None => return Err(ClientError::InvalidConfig(format!("request URI '{}' is not absolute", uri))),
        }

        let host = uri
            .host()
            .ok_or_else(|| ClientError::InvalidConfig(format!("request URI '{}' has no host", uri)))?;
        let port = uri.port_u16().unwrap_or(80);

        let host_header = match uri.port_u16() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let host_header = HeaderValue::from_str(&host_header)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid host '{}': {}", host, e)))?;

        let origin_form = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .parse::<Uri>()
            .map_err(|e| ClientError::InvalidConfig(format!("invalid request path: {}", e)))?;

        let address = if host.starts_with('[') {
            format!("{}:{}", host, port)
        } else if host.contains(':') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };

        Ok(Self {
            address,
            host_header,
            origin_form,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn post(uri: &str) -> HttpRequest {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Bytes::from_static(b"{\"query\":\"query { ping }\"}"))
            .unwrap()
    }

    #[test]
    fn test_target_from_uri() {
        let target = Target::from_uri(&"http://localhost:8080/read/graphql?x=1".parse().unwrap()).unwrap();
        assert_eq!(target.address, "localhost:8080");
        assert_eq!(target.host_header, "localhost:8080");
        assert_eq!(target.origin_form, "/read/graphql?x=1");

        let target = Target::from_uri(&"http://example.com".parse().unwrap()).unwrap();
        assert_eq!(target.address, "example.com:80");
        assert_eq!(target.host_header, "example.com");
        assert_eq!(target.origin_form, "/");
    }

    #[test]
    fn test_https_is_rejected() {
        let err = Target::from_uri(&"https://example.com/graphql".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedScheme(s) if s == "https"));
    }

    #[tokio::test]
    async fn test_round_trip_against_raw_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = "{\"data\":{\"ping\":\"pong\"}}";
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        let response = HyperTransport::new()
            .send(post(&format!("http://{}/graphql", addr)), TransportTimeouts::default())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"{\"data\":{\"ping\":\"pong\"}}");
    }

    #[tokio::test]
    async fn test_silent_server_hits_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let timeouts = TransportTimeouts {
            connect: Some(Duration::from_secs(1)),
            read: Some(Duration::from_millis(50)),
        };
        let err = HyperTransport::new()
            .send(post(&format!("http://{}/graphql", addr)), timeouts)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ReadTimeout(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let err = HyperTransport::new()
            .send(post(&format!("http://{}/graphql", addr)), TransportTimeouts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
