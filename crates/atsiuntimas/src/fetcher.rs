//! HTTP transport used by the retrieval cascade.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::AttemptError;

/// Raw response of one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body looks like an HTML page rather than a JSON document.
    pub fn looks_like_markup(&self) -> bool {
        self.body.trim_start().starts_with('<')
    }
}

/// Performs a single GET. Implementations must not retry on their own.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, AttemptError>;
}

/// reqwest-backed fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, AttemptError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse { status, body })
    }
}

impl HttpFetcher {
    fn map_error(&self, err: reqwest::Error) -> AttemptError {
        if err.is_timeout() {
            AttemptError::Timeout(self.timeout)
        } else {
            AttemptError::Network(err.to_string())
        }
    }
}
