//! Client store and client key resolution
//!
//! The client store owns the durable [`ClientInfo`] records; this crate only
//! reads them. [`InMemoryClientStore`] is the embedded implementation used by
//! tests and small deployments; production deployments implement
//! [`ClientStore`] over their own persistence.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::fetch::{FetchError, MetadataFetcher};
use crate::types::ClientInfo;

/// Read access to registered clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Look up a client by id. `None` when no such client is registered.
    async fn find_client(&self, client_id: &str) -> Option<ClientInfo>;
}

/// Concurrent in-memory [`ClientStore`].
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: DashMap<String, ClientInfo>,
}

impl InMemoryClientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a client record.
    pub fn insert(&self, client: ClientInfo) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Remove a client record.
    pub fn remove(&self, client_id: &str) -> bool {
        self.clients.remove(client_id).is_some()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn find_client(&self, client_id: &str) -> Option<ClientInfo> {
        self.clients.get(client_id).map(|entry| entry.value().clone())
    }
}

/// Failures while resolving a client's signing keys.
#[derive(Debug, Clone, Error)]
pub enum ClientKeysError {
    /// The referenced JWK set could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The client's `jwks_uri` is not a valid URL.
    #[error("invalid jwks_uri: {0}")]
    InvalidUri(String),
    /// The fetched document is not a JWK set.
    #[error("invalid JWK set: {0}")]
    Decode(String),
}

/// Resolves the JWK set a client's assertions and certificates are verified
/// against.
#[async_trait]
pub trait ClientKeysProvider: Send + Sync {
    /// The client's signing keys, in the order they appear in the set.
    async fn signing_keys(&self, client: &ClientInfo) -> Result<Vec<Jwk>, ClientKeysError>;
}

/// [`ClientKeysProvider`] that prefers the inline JWK set and falls back to
/// fetching `jwks_uri` through the injected [`MetadataFetcher`].
pub struct StandardClientKeysProvider {
    fetcher: Arc<dyn MetadataFetcher>,
}

impl StandardClientKeysProvider {
    /// Create a provider fetching referenced sets via `fetcher`.
    pub fn new(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ClientKeysProvider for StandardClientKeysProvider {
    async fn signing_keys(&self, client: &ClientInfo) -> Result<Vec<Jwk>, ClientKeysError> {
        if let Some(jwks) = &client.jwks {
            return Ok(jwks.keys.clone());
        }

        let Some(jwks_uri) = &client.jwks_uri else {
            debug!(client_id = %client.client_id, "Client has no JWK set configured");
            return Ok(Vec::new());
        };

        let url =
            Url::parse(jwks_uri).map_err(|e| ClientKeysError::InvalidUri(e.to_string()))?;
        let document = self.fetcher.fetch_json(&url).await?;
        let set: JwkSet = serde_json::from_value(document)
            .map_err(|e| ClientKeysError::Decode(e.to_string()))?;

        debug!(
            client_id = %client.client_id,
            key_count = set.keys.len(),
            "Fetched client JWK set"
        );
        Ok(set.keys)
    }
}
