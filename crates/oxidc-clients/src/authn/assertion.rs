//! JWT assertion authentication (RFC 7523)
//!
//! `client_secret_jwt` and `private_key_jwt` share one flow and differ only
//! in key material: symmetric `oct` keys for the former, asymmetric keys for
//! the latter. The flow:
//!
//! 1. `client_assertion_type` must be the JWT bearer URN and the assertion
//!    non-empty;
//! 2. the client is located by the `client_id` form field or, failing that,
//!    the assertion's unverified `iss` claim (trusted for lookup only);
//! 3. the configured auth method must match;
//! 4. the injected verifier checks the signature against the client's keys
//!    with the receiving endpoint as required audience;
//! 5. the verified `iss` and `sub` must both equal the client id;
//! 6. a `jti`, when present, is marked used in the replay registry with the
//!    assertion's own expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use tracing::debug;

use crate::assertion::{AssertionVerifier, unverified_issuer};
use crate::authn::ClientAuthenticator;
use crate::replay::{ReplayRegistry, TokenStatus};
use crate::store::{ClientKeysProvider, ClientStore};
use crate::types::{AuthMethod, ClientInfo, ClientRequest, JWT_BEARER_ASSERTION_TYPE};

struct AssertionFlow {
    store: Arc<dyn ClientStore>,
    keys: Arc<dyn ClientKeysProvider>,
    verifier: Arc<dyn AssertionVerifier>,
    replay: Arc<dyn ReplayRegistry>,
    expected_method: AuthMethod,
}

impl AssertionFlow {
    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        if request.client_assertion_type.as_deref() != Some(JWT_BEARER_ASSERTION_TYPE) {
            return None;
        }
        let assertion = request.client_assertion.as_deref().filter(|a| !a.is_empty())?;

        let client_id = match &request.client_id {
            Some(client_id) => client_id.clone(),
            None => unverified_issuer(assertion)?,
        };

        let client = self.store.find_client(&client_id).await?;
        if client.auth_method != self.expected_method {
            debug!(
                client_id = %client_id,
                configured = %client.auth_method,
                expected = %self.expected_method,
                "Client is not configured for this assertion method"
            );
            return None;
        }

        let keys: Vec<Jwk> = self
            .keys
            .signing_keys(&client)
            .await
            .ok()?
            .into_iter()
            .filter(|jwk| {
                let symmetric = matches!(jwk.algorithm, AlgorithmParameters::OctetKey(_));
                match self.expected_method {
                    AuthMethod::ClientSecretJwt => symmetric,
                    _ => !symmetric,
                }
            })
            .collect();
        if keys.is_empty() {
            debug!(client_id = %client_id, "Client has no usable assertion keys");
            return None;
        }

        let claims = match self
            .verifier
            .verify(assertion, &request.endpoint, &keys)
            .await
        {
            Ok(claims) => claims,
            Err(error) => {
                debug!(client_id = %client_id, error = %error, "Assertion verification failed");
                return None;
            }
        };

        if claims.iss.as_deref() != Some(client_id.as_str())
            || claims.sub.as_deref() != Some(client_id.as_str())
        {
            debug!(client_id = %client_id, "Assertion issuer/subject does not match the client");
            return None;
        }

        if let Some(jti) = &claims.jti {
            let expires_at = claims
                .exp
                .and_then(|exp| DateTime::from_timestamp(i64::try_from(exp).ok()?, 0));
            self.replay
                .set_status(jti, TokenStatus::Used, expires_at)
                .await;
        }

        Some(client)
    }
}

/// `client_secret_jwt`: HMAC assertions verified against the client's
/// symmetric keys.
pub struct SecretJwtAuthenticator {
    flow: AssertionFlow,
    methods: [AuthMethod; 1],
}

impl SecretJwtAuthenticator {
    /// Authenticator wiring the store, key provider, verifier, and replay
    /// registry together.
    pub fn new(
        store: Arc<dyn ClientStore>,
        keys: Arc<dyn ClientKeysProvider>,
        verifier: Arc<dyn AssertionVerifier>,
        replay: Arc<dyn ReplayRegistry>,
    ) -> Self {
        Self {
            flow: AssertionFlow {
                store,
                keys,
                verifier,
                replay,
                expected_method: AuthMethod::ClientSecretJwt,
            },
            methods: [AuthMethod::ClientSecretJwt],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for SecretJwtAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        self.flow.authenticate(request).await
    }
}

/// `private_key_jwt`: asymmetrically signed assertions verified against the
/// client's own JWK set.
pub struct PrivateKeyJwtAuthenticator {
    flow: AssertionFlow,
    methods: [AuthMethod; 1],
}

impl PrivateKeyJwtAuthenticator {
    /// Authenticator wiring the store, key provider, verifier, and replay
    /// registry together.
    pub fn new(
        store: Arc<dyn ClientStore>,
        keys: Arc<dyn ClientKeysProvider>,
        verifier: Arc<dyn AssertionVerifier>,
        replay: Arc<dyn ReplayRegistry>,
    ) -> Self {
        Self {
            flow: AssertionFlow {
                store,
                keys,
                verifier,
                replay,
                expected_method: AuthMethod::PrivateKeyJwt,
            },
            methods: [AuthMethod::PrivateKeyJwt],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for PrivateKeyJwtAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        self.flow.authenticate(request).await
    }
}
