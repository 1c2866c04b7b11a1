//! Hardened metadata fetching
//!
//! Registration can pull two kinds of documents from client-controlled URLs:
//! sector identifier documents and JWK sets by reference. Fetching anything
//! from a URL the client chose is an SSRF vector, so the default fetcher is
//! deliberately restrictive:
//!
//! - https only (cleartext http is tolerated for loopback hosts, which local
//!   development needs)
//! - no redirect following
//! - response size cap (64 KiB)
//! - request timeout (10 seconds)
//! - errors are never cached or retried here; the caller decides

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Maximum document size the default fetcher accepts.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Request timeout of the default fetcher.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch failures.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The URL scheme is not https.
    #[error("URL scheme not allowed: {0} (only https is permitted)")]
    InvalidScheme(String),
    /// The server answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),
    /// The response exceeded the size cap.
    #[error("response size limit exceeded: more than {0} bytes")]
    ResponseTooLarge(usize),
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Network(String),
    /// The body is not the expected JSON.
    #[error("invalid document: {0}")]
    Decode(String),
}

/// A JSON document fetcher with provider-controlled hardening.
///
/// Injected into the subject-type validator (sector identifier documents) and
/// the client keys provider (JWK sets by reference).
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch `url` and decode the body as JSON.
    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, FetchError>;
}

/// [`MetadataFetcher`] backed by `reqwest` with the restrictions above.
#[derive(Debug, Clone)]
pub struct HttpMetadataFetcher {
    http_client: reqwest::Client,
    max_response_size: usize,
}

impl HttpMetadataFetcher {
    /// Create a fetcher with the default limits.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("failed to create HTTP client"),
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Override the response size cap.
    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }
}

impl Default for HttpMetadataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, FetchError> {
        let loopback_http = url.scheme() == "http" && crate::uri::has_loopback_host(url);
        if url.scheme() != "https" && !loopback_http {
            return Err(FetchError::InvalidScheme(url.scheme().to_string()));
        }

        debug!(url = %url, "Fetching metadata document");

        let response = self
            .http_client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Metadata fetch failed");
                FetchError::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Metadata endpoint returned error status");
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if body.len() > self.max_response_size {
            warn!(
                url = %url,
                size = body.len(),
                limit = self.max_response_size,
                "Metadata document over size limit"
            );
            return Err(FetchError::ResponseTooLarge(self.max_response_size));
        }

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
