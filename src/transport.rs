//! Live HTTP transport used in passthrough and record modes

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::matcher::HttpRequest;
use crate::record::HttpResponse;
use crate::{Result, TapedeckError};

/// The single capability the orchestrator needs from the real network:
/// send one request, get one response. The forward may suspend; callers
/// must not hold any store lock across it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Forward `request` to the live endpoint and return its response
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Pooled HTTP client over the live network
pub struct HttpTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransport {
    /// Create a new transport with a pooled connection client
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build_http();

        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let uri = request
            .uri
            .parse::<Uri>()
            .map_err(|e| TapedeckError::Transport(format!("Invalid URI '{}': {e}", request.uri)))?;

        let method = request.method.parse::<Method>().map_err(|e| {
            TapedeckError::Transport(format!("Invalid HTTP method '{}': {e}", request.method))
        })?;

        debug!("Forwarding {} {}", method, uri);

        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let http_request = builder
            .body(Full::new(Bytes::copy_from_slice(&request.body)))
            .map_err(|e| TapedeckError::Transport(format!("Failed to build request: {e}")))?;

        let response = self.client.request(http_request).await.map_err(|e| {
            warn!("Forward failed: {e}");
            TapedeckError::Transport(format!("Request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<invalid>").to_string(),
                )
            })
            .collect();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TapedeckError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let transport = HttpTransport::new();
        let request = HttpRequest {
            method: "NOT A METHOD".to_string(),
            uri: "http://localhost/".to_string(),
            headers: vec![],
            body: vec![],
        };

        let result = transport.send(&request).await;
        assert!(matches!(result, Err(TapedeckError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_uri_rejected() {
        let transport = HttpTransport::new();
        let request = HttpRequest {
            method: "GET".to_string(),
            uri: "not a uri".to_string(),
            headers: vec![],
            body: vec![],
        };

        let result = transport.send(&request).await;
        assert!(matches!(result, Err(TapedeckError::Transport(_))));
    }
}
