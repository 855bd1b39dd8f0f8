use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Outcome of one raw HTTP attempt, before retry classification.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The provider answered with a non-success status code.
    Status(u16),
    /// The attempt never produced a usable response: connect failure,
    /// timeout, or an unreadable body.
    Network(String),
}

/// Abstraction over a single GET against the provider.
///
/// This trait intentionally hides:
/// - connection pooling
/// - TLS and URL construction
/// - body decoding
///
/// The cache/retry layers above it are exercised against scripted
/// implementations in tests; production uses [`HttpTransport`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value, FetchError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .http
            .get(&url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        debug!(path, "provider response received");

        Ok(body)
    }
}
