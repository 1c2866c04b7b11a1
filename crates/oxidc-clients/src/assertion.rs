//! JWT client assertion verification (RFC 7523)
//!
//! `client_secret_jwt` and `private_key_jwt` authenticate with a signed JWT
//! whose audience is the endpoint receiving it. Verification is injected as
//! [`AssertionVerifier`] so deployments can swap in an HSM-backed or remote
//! verifier; [`JwtAssertionVerifier`] is the default, built on `jsonwebtoken`:
//!
//! - algorithm allowlist checked before any cryptography (no `none`, no
//!   algorithm confusion)
//! - `kid`-directed key selection, falling back to trying each key
//! - audience, `exp`, and `nbf` enforced with 60 seconds of clock skew leeway
//!
//! The verifier's supported-algorithm set doubles as the provider capability
//! surface the registration pipeline checks declared signing algorithms
//! against. [`ResponseSigningKeys`] is the matching surface for the signing
//! side (ID Token and UserInfo response algorithms).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Clock skew leeway for `exp`/`nbf` checks, in seconds.
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

/// Claims carried by a verified client assertion.
#[derive(Debug, Clone, Deserialize)]
pub struct AssertionClaims {
    /// Issuer; must equal the client id.
    pub iss: Option<String>,
    /// Subject; must equal the client id.
    pub sub: Option<String>,
    /// Token identifier for replay prevention.
    pub jti: Option<String>,
    /// Expiry, seconds since the epoch.
    pub exp: Option<u64>,
}

/// Assertion verification failures.
///
/// These reach logs, never clients: the authenticators translate any failure
/// into a silent decline.
#[derive(Debug, Clone, Error)]
pub enum AssertionError {
    /// The compact serialization is broken.
    #[error("malformed assertion: {0}")]
    Malformed(String),
    /// The header algorithm is outside the allowlist.
    #[error("algorithm {0:?} not allowed")]
    AlgorithmNotAllowed(Algorithm),
    /// No provided key verifies the signature.
    #[error("no key verifies the assertion")]
    NoMatchingKey,
    /// Signature, audience, or time validation failed.
    #[error("assertion validation failed: {0}")]
    Invalid(String),
}

/// Verifies JWT client assertions and names the signing algorithms the
/// provider accepts.
#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    /// Signing algorithms accepted for inbound JWTs (assertions, request
    /// objects, CIBA requests). Case-sensitive names; `none` is accepted only
    /// if listed here.
    fn signing_algorithms_supported(&self) -> &[String];

    /// Verify `assertion` against `keys` with `audience` as the required
    /// audience.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError`] when the assertion is malformed, signed
    /// with a disallowed algorithm, or fails signature/audience/time checks
    /// against every key.
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
        keys: &[Jwk],
    ) -> Result<AssertionClaims, AssertionError>;
}

/// Names the algorithms the provider can sign responses with (ID Token,
/// UserInfo). Registration checks declared `*_signed_response_alg` values
/// against this set.
pub trait ResponseSigningKeys: Send + Sync {
    /// Supported signed-response algorithm names.
    fn signed_response_algorithms_supported(&self) -> &[String];
}

/// Static [`ResponseSigningKeys`] for providers with a fixed signing key
/// configuration.
#[derive(Debug, Clone)]
pub struct StaticResponseSigningKeys {
    algorithms: Vec<String>,
}

impl StaticResponseSigningKeys {
    /// A capability surface advertising exactly `algorithms`.
    pub fn new<I, S>(algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            algorithms: algorithms.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResponseSigningKeys for StaticResponseSigningKeys {
    fn signed_response_algorithms_supported(&self) -> &[String] {
        &self.algorithms
    }
}

/// Default [`AssertionVerifier`] on `jsonwebtoken`.
#[derive(Debug, Clone)]
pub struct JwtAssertionVerifier {
    allowed_algorithms: Vec<Algorithm>,
    algorithm_names: Vec<String>,
    leeway_secs: u64,
}

impl JwtAssertionVerifier {
    /// Verifier accepting the standard HMAC, RSA, RSA-PSS, and ECDSA
    /// algorithm families.
    pub fn new() -> Self {
        Self::with_algorithms(vec![
            Algorithm::HS256,
            Algorithm::HS384,
            Algorithm::HS512,
            Algorithm::RS256,
            Algorithm::RS384,
            Algorithm::RS512,
            Algorithm::PS256,
            Algorithm::ES256,
            Algorithm::ES384,
        ])
    }

    /// Verifier accepting exactly `algorithms`.
    pub fn with_algorithms(algorithms: Vec<Algorithm>) -> Self {
        let algorithm_names = algorithms
            .iter()
            .map(|algorithm| format!("{algorithm:?}"))
            .collect();
        Self {
            allowed_algorithms: algorithms,
            algorithm_names,
            leeway_secs: CLOCK_SKEW_LEEWAY_SECS,
        }
    }

    /// Override the clock skew leeway.
    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    fn decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
        match &jwk.algorithm {
            AlgorithmParameters::OctetKey(params) => {
                let secret = URL_SAFE_NO_PAD
                    .decode(params.value.trim_end_matches('='))
                    .ok()?;
                Some(DecodingKey::from_secret(&secret))
            }
            _ => DecodingKey::from_jwk(jwk).ok(),
        }
    }

    fn key_fits_algorithm(jwk: &Jwk, algorithm: Algorithm) -> bool {
        matches!(
            (&jwk.algorithm, algorithm),
            (
                AlgorithmParameters::OctetKey(_),
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
            ) | (
                AlgorithmParameters::RSA(_),
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ) | (
                AlgorithmParameters::EllipticCurve(_),
                Algorithm::ES256 | Algorithm::ES384
            )
        )
    }
}

impl Default for JwtAssertionVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssertionVerifier for JwtAssertionVerifier {
    fn signing_algorithms_supported(&self) -> &[String] {
        &self.algorithm_names
    }

    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
        keys: &[Jwk],
    ) -> Result<AssertionClaims, AssertionError> {
        let header =
            decode_header(assertion).map_err(|e| AssertionError::Malformed(e.to_string()))?;

        if !self.allowed_algorithms.contains(&header.alg) {
            debug!(algorithm = ?header.alg, "Assertion algorithm not allowed");
            return Err(AssertionError::AlgorithmNotAllowed(header.alg));
        }

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[audience]);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;

        // kid narrows the candidate set; without one, every compatible key is
        // tried in set order.
        let candidates: Vec<&Jwk> = keys
            .iter()
            .filter(|jwk| Self::key_fits_algorithm(jwk, header.alg))
            .filter(|jwk| match (&header.kid, &jwk.common.key_id) {
                (Some(kid), Some(key_id)) => kid == key_id,
                _ => true,
            })
            .collect();

        let mut last_error = None;
        for jwk in candidates {
            let Some(key) = Self::decoding_key(jwk) else {
                continue;
            };
            match decode::<AssertionClaims>(assertion, &key, &validation) {
                Ok(token) => return Ok(token.claims),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => Err(AssertionError::Invalid(e.to_string())),
            None => Err(AssertionError::NoMatchingKey),
        }
    }
}

/// Read the `iss` claim without verifying the signature.
///
/// Used to locate the client record before its keys are known; nothing is
/// trusted until [`AssertionVerifier::verify`] succeeds and the issuer is
/// compared against the authenticated client id. Same payload-peek the
/// multi-issuer token validators do.
pub fn unverified_issuer(assertion: &str) -> Option<String> {
    let mut parts = assertion.split('.');
    let payload = parts.nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("iss")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn hmac_jwk(kid: &str, secret: &[u8]) -> Jwk {
        let set: JwkSet = serde_json::from_value(json!({
            "keys": [{
                "kty": "oct",
                "kid": kid,
                "k": URL_SAFE_NO_PAD.encode(secret)
            }]
        }))
        .unwrap();
        set.keys.into_iter().next().unwrap()
    }

    fn signed_assertion(secret: &[u8], claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn claims(audience: &str) -> serde_json::Value {
        json!({
            "iss": "cid",
            "sub": "cid",
            "aud": audience,
            "jti": "assertion-1",
            "exp": chrono::Utc::now().timestamp() + 300
        })
    }

    #[tokio::test]
    async fn verifies_hmac_assertion() {
        let secret = b"a-shared-secret-of-decent-length";
        let verifier = JwtAssertionVerifier::new();
        let assertion = signed_assertion(secret, &claims("https://op.example.com/token"));

        let claims = verifier
            .verify(
                &assertion,
                "https://op.example.com/token",
                &[hmac_jwk("k1", secret)],
            )
            .await
            .unwrap();

        assert_eq!(claims.iss.as_deref(), Some("cid"));
        assert_eq!(claims.sub.as_deref(), Some("cid"));
        assert_eq!(claims.jti.as_deref(), Some("assertion-1"));
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let secret = b"a-shared-secret-of-decent-length";
        let verifier = JwtAssertionVerifier::new();
        let assertion = signed_assertion(secret, &claims("https://other.example.com/token"));

        let result = verifier
            .verify(
                &assertion,
                "https://op.example.com/token",
                &[hmac_jwk("k1", secret)],
            )
            .await;
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }

    #[tokio::test]
    async fn rejects_wrong_key() {
        let verifier = JwtAssertionVerifier::new();
        let assertion = signed_assertion(
            b"a-shared-secret-of-decent-length",
            &claims("https://op.example.com/token"),
        );

        let result = verifier
            .verify(
                &assertion,
                "https://op.example.com/token",
                &[hmac_jwk("k1", b"a-different-secret-entirely-here")],
            )
            .await;
        assert!(matches!(result, Err(AssertionError::Invalid(_))));
    }

    #[tokio::test]
    async fn rejects_disallowed_algorithm() {
        let secret = b"a-shared-secret-of-decent-length";
        let verifier = JwtAssertionVerifier::with_algorithms(vec![Algorithm::RS256]);
        let assertion = signed_assertion(secret, &claims("https://op.example.com/token"));

        let result = verifier
            .verify(
                &assertion,
                "https://op.example.com/token",
                &[hmac_jwk("k1", secret)],
            )
            .await;
        assert!(matches!(
            result,
            Err(AssertionError::AlgorithmNotAllowed(Algorithm::HS256))
        ));
    }

    #[tokio::test]
    async fn no_keys_is_no_matching_key() {
        let verifier = JwtAssertionVerifier::new();
        let assertion = signed_assertion(
            b"a-shared-secret-of-decent-length",
            &claims("https://op.example.com/token"),
        );

        let result = verifier
            .verify(&assertion, "https://op.example.com/token", &[])
            .await;
        assert!(matches!(result, Err(AssertionError::NoMatchingKey)));
    }

    #[test]
    fn supported_algorithm_names_are_jose_names() {
        let verifier = JwtAssertionVerifier::new();
        let names = verifier.signing_algorithms_supported();
        assert!(names.iter().any(|name| name == "HS256"));
        assert!(names.iter().any(|name| name == "RS256"));
        assert!(names.iter().any(|name| name == "ES256"));
        assert!(!names.iter().any(|name| name == "none"));
    }

    #[test]
    fn unverified_issuer_peeks_payload() {
        let assertion = signed_assertion(
            b"a-shared-secret-of-decent-length",
            &claims("https://op.example.com/token"),
        );
        assert_eq!(unverified_issuer(&assertion).as_deref(), Some("cid"));
        assert_eq!(unverified_issuer("not-a-jwt"), None);
    }
}
