//! dync-dns — node address registration.
//!
//! Thin client for the DNS service that fronts test clusters: one
//! `PUT /<domain>/<hostname>` with a JSON list of addresses, HTTP 200
//! expected, retried a few times with a doubling delay. Registration is
//! an optimization — callers log failures and move on, so nothing here
//! is load-bearing for cluster correctness.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

/// Result type alias for registrar operations.
pub type DnsResult<T> = Result<T, DnsError>;

/// Errors from the DNS registrar endpoint.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("registrar connection error: {0}")]
    Connection(String),

    #[error("registrar returned status {0}")]
    UnexpectedStatus(u16),
}

/// Client for the remote DNS registration endpoint.
#[derive(Debug, Clone)]
pub struct DnsRegistrar {
    host: String,
    port: u16,
    domain: String,
    attempts: u32,
    retry_delay: Duration,
}

impl DnsRegistrar {
    pub fn new(host: impl Into<String>, port: u16, domain: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            domain: domain.into(),
            attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }

    /// Override the retry policy (mainly for tests).
    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Domain this registrar manages; node hostnames live under it.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn request_path(&self, hostname: &str) -> String {
        format!("/{}/{}", self.domain, hostname)
    }

    fn request_body(ip: &str) -> Bytes {
        Bytes::from(serde_json::json!({ "ips": [ip] }).to_string())
    }

    /// Register `hostname` → `ip`, retrying transient failures.
    pub async fn register(&self, hostname: &str, ip: &str) -> DnsResult<()> {
        let path = self.request_path(hostname);
        let body = Self::request_body(ip);

        let mut delay = self.retry_delay;
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.put_once(&path, body.clone()).await {
                Ok(()) => {
                    debug!(%hostname, %ip, attempt, "address registered");
                    return Ok(());
                }
                Err(e) => {
                    debug!(%hostname, %ip, attempt, error = %e, "registration attempt failed");
                    last_err = Some(e);
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
        Err(last_err.expect("at least one attempt"))
    }

    async fn put_once(&self, path: &str, body: Bytes) -> DnsResult<()> {
        let authority = format!("{}:{}", self.host, self.port);
        let stream = TcpStream::connect(&authority)
            .await
            .map_err(|e| DnsError::Connection(e.to_string()))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| DnsError::Connection(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("PUT")
            .uri(path)
            .header("host", &authority)
            .header("content-type", "application/json")
            .body(Full::new(body))
            .expect("static request parts");

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| DnsError::Connection(e.to_string()))?;

        // Drain the body so the connection task can finish cleanly.
        let status = resp.status();
        let _ = resp.into_body().collect().await;

        if status == http::StatusCode::OK {
            Ok(())
        } else {
            Err(DnsError::UnexpectedStatus(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal one-shot HTTP server answering every request with `status`.
    async fn serve(listener: TcpListener, status: u16, hits: Arc<AtomicU32>) {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            hits.fetch_add(1, Ordering::SeqCst);
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let reply = format!("HTTP/1.1 {status} X\r\ncontent-length: 0\r\n\r\n");
            let _ = socket.write_all(reply.as_bytes()).await;
        }
    }

    async fn registrar_against(status: u16) -> (DnsRegistrar, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicU32::new(0));
        tokio::spawn(serve(listener, status, hits.clone()));

        let registrar = DnsRegistrar::new("127.0.0.1", port, "couchbase.com")
            .with_retry(3, Duration::from_millis(1));
        (registrar, hits)
    }

    #[test]
    fn path_and_body_composition() {
        let registrar = DnsRegistrar::new("10.1.2.3", 80, "couchbase.com");
        assert_eq!(
            registrar.request_path("dynclsr-abc-node_1.couchbase.com"),
            "/couchbase.com/dynclsr-abc-node_1.couchbase.com"
        );
        assert_eq!(
            DnsRegistrar::request_body("192.168.0.7"),
            Bytes::from(r#"{"ips":["192.168.0.7"]}"#)
        );
    }

    #[tokio::test]
    async fn register_succeeds_on_200() {
        let (registrar, hits) = registrar_against(200).await;
        registrar.register("host.couchbase.com", "10.0.0.1").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn register_retries_then_reports_status() {
        let (registrar, hits) = registrar_against(500).await;
        let err = registrar
            .register("host.couchbase.com", "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, DnsError::UnexpectedStatus(500)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn register_fails_without_endpoint() {
        // Connect to a port nothing listens on.
        let registrar = DnsRegistrar::new("127.0.0.1", 1, "couchbase.com")
            .with_retry(1, Duration::from_millis(1));
        let err = registrar.register("h", "10.0.0.1").await.unwrap_err();
        assert!(matches!(err, DnsError::Connection(_)));
    }
}
