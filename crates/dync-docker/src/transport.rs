//! HTTP transport to the engine socket.
//!
//! One connection per request, http1 handshake driven in a background
//! task. The engine endpoint is either a unix socket or a TCP address.

use std::path::PathBuf;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

use dync_runtime::{RuntimeError, RuntimeResult};

/// Parsed engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Unix(PathBuf),
    /// `host:port` authority.
    Tcp(String),
}

impl Endpoint {
    pub(crate) fn parse(endpoint: &str) -> RuntimeResult<Self> {
        if let Some(path) = endpoint.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(RuntimeError::Connection(format!(
                    "invalid engine endpoint: {endpoint}"
                )));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if let Some(authority) = endpoint.strip_prefix("tcp://") {
            if authority.is_empty() || !authority.contains(':') {
                return Err(RuntimeError::Connection(format!(
                    "invalid engine endpoint: {endpoint}"
                )));
            }
            return Ok(Self::Tcp(authority.to_string()));
        }
        Err(RuntimeError::Connection(format!(
            "unsupported engine endpoint scheme: {endpoint}"
        )))
    }
}

/// Per-request HTTP client over the engine endpoint.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    endpoint: Endpoint,
}

impl HttpTransport {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Issue one request; returns status and collected body.
    pub(crate) async fn request(
        &self,
        method: &str,
        path_and_query: &str,
        body: Option<Vec<u8>>,
    ) -> RuntimeResult<(http::StatusCode, Bytes)> {
        let (host, req) = self.build_request(method, path_and_query, body)?;
        match &self.endpoint {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| RuntimeError::Connection(e.to_string()))?;
                roundtrip(stream, req).await
            }
            Endpoint::Tcp(_) => {
                let stream = TcpStream::connect(&host)
                    .await
                    .map_err(|e| RuntimeError::Connection(e.to_string()))?;
                roundtrip(stream, req).await
            }
        }
    }

    fn build_request(
        &self,
        method: &str,
        path_and_query: &str,
        body: Option<Vec<u8>>,
    ) -> RuntimeResult<(String, http::Request<Full<Bytes>>)> {
        let host = match &self.endpoint {
            // The engine ignores the Host header on unix sockets, but
            // http1 requires one.
            Endpoint::Unix(_) => "localhost".to_string(),
            Endpoint::Tcp(authority) => authority.clone(),
        };

        let mut builder = http::Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("host", &host);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        Ok((host, req))
    }
}

async fn roundtrip<S>(
    stream: S,
    req: http::Request<Full<Bytes>>,
) -> RuntimeResult<(http::StatusCode, Bytes)>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| RuntimeError::Connection(e.to_string()))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| RuntimeError::Connection(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| RuntimeError::Protocol(e.to_string()))?
        .to_bytes();
    Ok((status, body))
}
