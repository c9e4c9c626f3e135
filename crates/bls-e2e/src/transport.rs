//! Transport client for the service under test.
//!
//! HTTP calls never surface a Rust error: any transport-level failure
//! (connection refused, unreadable body, malformed JSON) is folded into a
//! synthetic [`ApiResponse`] with status [`TRANSPORT_FAILURE_STATUS`] and an
//! `{"error": ...}` body, so suites only ever branch on status and shape.
//!
//! The streaming channel is the one place with a typed error, because a
//! receive timeout must stay distinguishable from a protocol failure.

use async_trait::async_trait;
use bls_proto::paths;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// Status reported for requests that never produced a usable response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// HTTP methods the harness issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Uniform `(status, payload)` result of an HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    /// Set when the response was synthesized from a transport failure.
    pub synthetic: bool,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            synthetic: false,
        }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            body: json!({ "error": message.into() }),
            synthetic: true,
        }
    }

    /// The failure text of a synthetic response.
    pub fn transport_error(&self) -> Option<&str> {
        if self.synthetic {
            self.body.get("error").and_then(Value::as_str)
        } else {
            None
        }
    }
}

/// Errors from the streaming channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("no message within {0:?}")]
    TimedOut(Duration),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("stream closed by peer")]
    Closed,
}

/// A duplex text channel.
#[async_trait]
pub trait StreamChannel: Send {
    async fn send(&mut self, text: &str) -> Result<(), StreamError>;

    /// Waits for the next text frame, failing with [`StreamError::TimedOut`]
    /// if none arrives within `timeout`.
    async fn receive(&mut self, timeout: Duration) -> Result<String, StreamError>;

    async fn close(&mut self);
}

/// Access to the service under test.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a request against the API root. Never fails; see the module docs.
    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResponse;

    /// Opens the streaming channel at `path` relative to the base URL.
    async fn open_stream(&self, path: &str) -> Result<Box<dyn StreamChannel>, StreamError>;

    /// Releases client resources. Called once by the run controller.
    fn shutdown(&self) {}
}

/// `reqwest` + `tokio-tungstenite` transport against a live deployment.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_root: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder().build()?;
        let api_root = format!("{}{}", base_url, paths::API_PREFIX);

        Ok(Self {
            client,
            base_url,
            api_root,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResponse {
        let url = format!("{}{}", self.api_root, path);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method.into(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                return ApiResponse::transport_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%method, %url, status, error = %e, "failed to read response body");
                return ApiResponse::transport_failure(format!("failed to read body: {e}"));
            }
        };

        match decode_body(&text) {
            Ok(body) => {
                debug!(%method, %url, status, "received response");
                ApiResponse::new(status, body)
            }
            Err(e) => {
                warn!(%method, %url, status, error = %e, "malformed response body");
                ApiResponse::transport_failure(format!(
                    "malformed response body (HTTP {status}): {e}"
                ))
            }
        }
    }

    async fn open_stream(&self, path: &str) -> Result<Box<dyn StreamChannel>, StreamError> {
        let url = stream_url(&self.base_url, path);
        debug!(%url, "opening stream");

        let (inner, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;

        Ok(Box::new(WsChannel { inner }))
    }

    fn shutdown(&self) {
        debug!(base_url = %self.base_url, "transport released");
    }
}

/// Parses a response body. An empty body is JSON `null`.
fn decode_body(text: &str) -> Result<Value, serde_json::Error> {
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(text)
    }
}

/// Maps an `http(s)` base URL onto the matching `ws(s)` URL for `path`.
pub fn stream_url(base_url: &str, path: &str) -> String {
    let base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{base}{path}")
}

struct WsChannel {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamChannel for WsChannel {
    async fn send(&mut self, text: &str) -> Result<(), StreamError> {
        self.inner
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| StreamError::Protocol(e.to_string()))
    }

    async fn receive(&mut self, timeout: Duration) -> Result<String, StreamError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let Ok(next) = tokio::time::timeout_at(deadline, self.inner.next()).await else {
                return Err(StreamError::TimedOut(timeout));
            };

            match next {
                None | Some(Ok(Message::Close(_))) => return Err(StreamError::Closed),
                Some(Err(e)) => return Err(StreamError::Protocol(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes).map_err(|e| {
                        StreamError::Protocol(format!("binary frame is not UTF-8: {e}"))
                    });
                }
                // Control frames; tungstenite answers pings itself.
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            debug!(error = %e, "stream close failed");
        }
    }
}
