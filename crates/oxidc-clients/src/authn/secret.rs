//! Shared-secret authentication (RFC 6749 Section 2.3.1)
//!
//! `client_secret_basic` reads the credential from the `Authorization` header
//! (`Basic base64(urlencode(id):urlencode(secret))` per RFC 6749
//! Appendix B); `client_secret_post` reads the body form fields. Both verify
//! the presented secret against the client's stored digest entries:
//!
//! - SHA-512 and SHA-256 of the presented secret are computed once;
//! - an entry matches when either stored digest equals the computed one
//!   (SHA-512 consulted first), compared in constant time;
//! - expired entries never match; among matching live entries the one with
//!   the latest expiry is taken, so rotated-in secrets win over soon-to-die
//!   ones.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::authn::ClientAuthenticator;
use crate::store::ClientStore;
use crate::types::{AuthMethod, ClientInfo, ClientRequest, ClientSecret};

/// Decode `Authorization: Basic ...` into `(client_id, client_secret)`.
///
/// `None` for a missing or non-Basic scheme, broken base64, no colon
/// separator, or an id/secret that is empty after trimming.
fn decode_basic_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, payload) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (raw_id, raw_secret) = decoded.split_once(':')?;

    let client_id = urlencoding::decode(raw_id).ok()?.trim().to_string();
    let client_secret = urlencoding::decode(raw_secret).ok()?.trim().to_string();
    if client_id.is_empty() || client_secret.is_empty() {
        return None;
    }
    Some((client_id, client_secret))
}

/// The stored entry the presented secret matches, if any live entry does.
fn matching_secret<'a>(
    secrets: &'a [ClientSecret],
    presented: &str,
    now: DateTime<Utc>,
) -> Option<&'a ClientSecret> {
    let sha512 = Sha512::digest(presented.as_bytes());
    let sha256 = Sha256::digest(presented.as_bytes());

    let digest_matches = |entry: &ClientSecret| {
        let sha512_hit = entry
            .sha512
            .as_ref()
            .is_some_and(|stored| bool::from(stored.as_slice().ct_eq(sha512.as_slice())));
        sha512_hit
            || entry
                .sha256
                .as_ref()
                .is_some_and(|stored| bool::from(stored.as_slice().ct_eq(sha256.as_slice())))
    };

    secrets
        .iter()
        .filter(|entry| digest_matches(entry))
        .filter(|entry| !entry.is_expired(now))
        // No expiry outranks any dated entry: it is the furthest-out one.
        .max_by_key(|entry| entry.expires_at.unwrap_or(DateTime::<Utc>::MAX_UTC))
}

/// Look up the client and verify the presented secret against its entries.
async fn verify_with_store(
    store: &dyn ClientStore,
    client_id: &str,
    presented: &str,
    expected_method: AuthMethod,
) -> Option<ClientInfo> {
    let client = store.find_client(client_id).await?;
    if client.auth_method != expected_method {
        debug!(
            client_id = %client_id,
            configured = %client.auth_method,
            "Client is not configured for this authentication method"
        );
        return None;
    }
    if client.secrets.is_empty() {
        debug!(client_id = %client_id, "Client has no secrets configured");
        return None;
    }
    if matching_secret(&client.secrets, presented, Utc::now()).is_none() {
        debug!(client_id = %client_id, "Presented secret does not match any live entry");
        return None;
    }
    Some(client)
}

/// `client_secret_basic`: credentials from the `Authorization` header.
pub struct SecretBasicAuthenticator {
    store: Arc<dyn ClientStore>,
    methods: [AuthMethod; 1],
}

impl SecretBasicAuthenticator {
    /// Authenticator verifying against `store`.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self {
            store,
            methods: [AuthMethod::ClientSecretBasic],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for SecretBasicAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        let header = request.authorization.as_deref()?;
        let (client_id, client_secret) = decode_basic_credentials(header)?;
        verify_with_store(
            self.store.as_ref(),
            &client_id,
            &client_secret,
            AuthMethod::ClientSecretBasic,
        )
        .await
    }
}

/// `client_secret_post`: credentials from the body form fields.
pub struct SecretPostAuthenticator {
    store: Arc<dyn ClientStore>,
    methods: [AuthMethod; 1],
}

impl SecretPostAuthenticator {
    /// Authenticator verifying against `store`.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self {
            store,
            methods: [AuthMethod::ClientSecretPost],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for SecretPostAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        let client_id = request.client_id.as_deref()?.trim();
        let client_secret = request.secret()?.trim();
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        verify_with_store(
            self.store.as_ref(),
            client_id,
            client_secret,
            AuthMethod::ClientSecretPost,
        )
        .await
    }
}
