//! Core client model types
//!
//! The registration request DTO uses RFC 7591 wire names and is immutable for
//! the duration of validation. [`ClientInfo`] is the durable record owned by
//! the client store; authenticators only read it. [`ClientRequest`] is the
//! ephemeral token-endpoint authentication input, one per attempt.

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::JwkSet;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::cert::ClientCertificate;

/// The `client_assertion_type` value for JWT bearer client assertions
/// (RFC 7523 Section 2.2).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// OAuth application type (RFC 7591 `application_type`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    /// Web application: https redirect URIs on a non-loopback host.
    #[default]
    Web,
    /// Native application: custom schemes or loopback http redirect URIs.
    Native,
}

/// OIDC subject type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    /// One `sub` value for all clients.
    #[default]
    Public,
    /// Per-sector `sub` values to prevent cross-client correlation.
    Pairwise,
}

/// Whether a registered client can keep a credential confidential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Cannot hold a secret (native apps, SPAs).
    Public,
    /// Holds a secret or key and authenticates at the token endpoint.
    Confidential,
}

/// Token endpoint client authentication methods this library knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// HTTP Basic authentication (RFC 6749 Section 2.3.1).
    ClientSecretBasic,
    /// Credentials in the request body (RFC 6749 Section 2.3.1).
    ClientSecretPost,
    /// HMAC-signed JWT assertion (RFC 7523).
    ClientSecretJwt,
    /// Asymmetrically signed JWT assertion (RFC 7523).
    PrivateKeyJwt,
    /// CA-issued certificate matched against registered DN/SAN metadata
    /// (RFC 8705).
    TlsClientAuth,
    /// Self-signed certificate matched by public key against a JWK set
    /// (RFC 8705).
    SelfSignedTlsClientAuth,
    /// Public client, no authentication.
    None,
}

impl AuthMethod {
    /// Wire representation of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::TlsClientAuth => "tls_client_auth",
            Self::SelfSignedTlsClientAuth => "self_signed_tls_client_auth",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client_secret_basic" => Ok(Self::ClientSecretBasic),
            "client_secret_post" => Ok(Self::ClientSecretPost),
            "client_secret_jwt" => Ok(Self::ClientSecretJwt),
            "private_key_jwt" => Ok(Self::PrivateKeyJwt),
            "tls_client_auth" => Ok(Self::TlsClientAuth),
            "self_signed_tls_client_auth" => Ok(Self::SelfSignedTlsClientAuth),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Client registration request per RFC 7591 Section 2, with the OIDC
/// registration and RFC 8705 extension fields.
///
/// Grant types, response types, auth methods, and CIBA delivery modes are kept
/// as raw strings: RFC 7591 treats them as open sets and the pipeline is
/// responsible for rejecting values the provider does not support, with a
/// structured error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs (REQUIRED for redirect-based grant types).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirect_uris: Vec<String>,

    /// Post-logout redirect URIs (OIDC RP-Initiated Logout).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_logout_redirect_uris: Vec<String>,

    /// Grant types the client will use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grant_types: Vec<String>,

    /// Response types the client will use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_types: Vec<String>,

    /// Application type (web, native). Defaults to web.
    #[serde(default)]
    pub application_type: ApplicationType,

    /// Subject type (public, pairwise). Defaults to public.
    #[serde(default)]
    pub subject_type: SubjectType,

    /// Sector identifier document URI for pairwise subjects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_identifier_uri: Option<String>,

    /// Token endpoint authentication method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<String>,

    /// Inline JWK set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<JwkSet>,

    /// JWK set by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Request object signing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_object_signing_alg: Option<String>,

    /// Token endpoint auth JWT signing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_signing_alg: Option<String>,

    /// CIBA signed authentication request algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backchannel_authentication_request_signing_alg: Option<String>,

    /// ID Token signing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_signed_response_alg: Option<String>,

    /// UserInfo response signing algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_signed_response_alg: Option<String>,

    /// CIBA token delivery mode (poll, ping, push).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backchannel_token_delivery_mode: Option<String>,

    /// CIBA client notification endpoint (ping and push modes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backchannel_client_notification_endpoint: Option<String>,

    /// Expected subject distinguished name for `tls_client_auth` (RFC 8705).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_auth_subject_dn: Option<String>,

    /// Expected SAN dNSName entries for `tls_client_auth`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls_client_auth_san_dns: Vec<String>,

    /// Expected SAN uniformResourceIdentifier entries for `tls_client_auth`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls_client_auth_san_uri: Vec<String>,

    /// Expected SAN iPAddress entries for `tls_client_auth`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls_client_auth_san_ip: Vec<String>,

    /// Expected SAN rfc822Name entries for `tls_client_auth`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls_client_auth_san_email: Vec<String>,

    /// Third-party initiated login URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiate_login_uri: Option<String>,

    /// Client-proposed client identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Human-readable client name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Client homepage URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_uri: Option<String>,

    /// Logo URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,

    /// Space-separated scope values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Contact email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,

    /// Terms of service URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tos_uri: Option<String>,

    /// Privacy policy URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,

    /// Software identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,

    /// Software version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

impl ClientRegistrationRequest {
    /// Whether any RFC 8705 certificate-binding metadata is present.
    pub fn has_tls_client_auth_metadata(&self) -> bool {
        self.tls_client_auth_subject_dn.is_some()
            || !self.tls_client_auth_san_dns.is_empty()
            || !self.tls_client_auth_san_uri.is_empty()
            || !self.tls_client_auth_san_ip.is_empty()
            || !self.tls_client_auth_san_email.is_empty()
    }

    /// Whether a JWK set is available, inline or by reference.
    pub fn has_jwks(&self) -> bool {
        self.jwks.is_some() || self.jwks_uri.is_some()
    }
}

/// Registered certificate-binding metadata for `tls_client_auth` (RFC 8705
/// Section 2.1.2). Exactly one field is normally populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsClientAuthMetadata {
    /// Expected subject distinguished name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_dn: Option<String>,
    /// Expected SAN dNSName entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub san_dns: Vec<String>,
    /// Expected SAN URI entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub san_uri: Vec<String>,
    /// Expected SAN IP address entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub san_ip: Vec<String>,
    /// Expected SAN email entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub san_email: Vec<String>,
}

impl TlsClientAuthMetadata {
    /// True when no binding field is populated.
    pub fn is_empty(&self) -> bool {
        self.subject_dn.is_none()
            && self.san_dns.is_empty()
            && self.san_uri.is_empty()
            && self.san_ip.is_empty()
            && self.san_email.is_empty()
    }
}

impl From<&ClientRegistrationRequest> for TlsClientAuthMetadata {
    fn from(request: &ClientRegistrationRequest) -> Self {
        Self {
            subject_dn: request.tls_client_auth_subject_dn.clone(),
            san_dns: request.tls_client_auth_san_dns.clone(),
            san_uri: request.tls_client_auth_san_uri.clone(),
            san_ip: request.tls_client_auth_san_ip.clone(),
            san_email: request.tls_client_auth_san_email.clone(),
        }
    }
}

/// One stored client secret entry: digests plus optional expiry.
///
/// Plaintext is never stored. Entries may carry a SHA-256 digest, a SHA-512
/// digest, or both; a presented secret matches the entry when either digest
/// matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecret {
    /// SHA-256 digest of the secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<Vec<u8>>,
    /// SHA-512 digest of the secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha512: Option<Vec<u8>>,
    /// When this entry stops being valid. `None` = never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ClientSecret {
    /// Build an entry holding the SHA-256 digest of `secret`.
    pub fn sha256_of(secret: &str) -> Self {
        Self {
            sha256: Some(Sha256::digest(secret.as_bytes()).to_vec()),
            sha512: None,
            expires_at: None,
        }
    }

    /// Build an entry holding the SHA-512 digest of `secret`.
    pub fn sha512_of(secret: &str) -> Self {
        Self {
            sha256: None,
            sha512: Some(Sha512::digest(secret.as_bytes()).to_vec()),
            expires_at: None,
        }
    }

    /// Set the expiry of this entry.
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the entry has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// The durable record of a registered client, as read by authenticators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client identifier.
    pub client_id: String,
    /// Public or confidential.
    pub client_type: ClientType,
    /// Configured token endpoint authentication method.
    pub auth_method: AuthMethod,
    /// Stored secret entries (rotation keeps several alive at once).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<ClientSecret>,
    /// Inline JWK set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<JwkSet>,
    /// JWK set by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    /// Registered certificate-binding metadata for `tls_client_auth`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_client_auth: Option<TlsClientAuthMetadata>,
    /// Sector identifier derived at registration time (pairwise subjects).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_identifier: Option<String>,
}

impl ClientInfo {
    /// A confidential client with the given id and auth method and no
    /// credentials yet.
    pub fn confidential(client_id: impl Into<String>, auth_method: AuthMethod) -> Self {
        Self {
            client_id: client_id.into(),
            client_type: ClientType::Confidential,
            auth_method,
            secrets: Vec::new(),
            jwks: None,
            jwks_uri: None,
            tls_client_auth: None,
            sector_identifier: None,
        }
    }

    /// A public client with the given id (auth method `none`).
    pub fn public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_type: ClientType::Public,
            auth_method: AuthMethod::None,
            secrets: Vec::new(),
            jwks: None,
            jwks_uri: None,
            tls_client_auth: None,
            sector_identifier: None,
        }
    }

    /// Add a stored secret entry.
    pub fn with_secret(mut self, secret: ClientSecret) -> Self {
        self.secrets.push(secret);
        self
    }

    /// Attach an inline JWK set.
    pub fn with_jwks(mut self, jwks: JwkSet) -> Self {
        self.jwks = Some(jwks);
        self
    }

    /// Attach a JWK set reference.
    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(jwks_uri.into());
        self
    }

    /// Attach certificate-binding metadata.
    pub fn with_tls_client_auth(mut self, metadata: TlsClientAuthMetadata) -> Self {
        self.tls_client_auth = Some(metadata);
        self
    }
}

/// An inbound token-endpoint authentication attempt.
///
/// Decoded from form fields, headers, and the TLS layer by the enclosing
/// endpoint; one instance per attempt, never shared across calls. The
/// presented secret is wrapped in [`SecretString`] so accidental `Debug`
/// output stays redacted.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    /// `client_id` form field.
    pub client_id: Option<String>,
    /// `client_secret` form field.
    pub client_secret: Option<SecretString>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// `client_assertion_type` form field.
    pub client_assertion_type: Option<String>,
    /// `client_assertion` form field.
    pub client_assertion: Option<String>,
    /// Peer TLS certificate, when the transport presented one.
    pub certificate: Option<ClientCertificate>,
    /// The endpoint URI this request arrived at; the expected audience of
    /// JWT client assertions.
    pub endpoint: String,
}

impl ClientRequest {
    /// An empty request addressed to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client_id: None,
            client_secret: None,
            authorization: None,
            client_assertion_type: None,
            client_assertion: None,
            certificate: None,
            endpoint: endpoint.into(),
        }
    }

    /// Set the `client_id` form field.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the `client_secret` form field.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set the `Authorization` header value.
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Set the client assertion fields.
    pub fn with_assertion(
        mut self,
        assertion_type: impl Into<String>,
        assertion: impl Into<String>,
    ) -> Self {
        self.client_assertion_type = Some(assertion_type.into());
        self.client_assertion = Some(assertion.into());
        self
    }

    /// Attach the peer TLS certificate.
    pub fn with_certificate(mut self, certificate: ClientCertificate) -> Self {
        self.certificate = Some(certificate);
        self
    }

    /// The presented secret, if any.
    pub fn secret(&self) -> Option<&str> {
        self.client_secret
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_request_uses_rfc7591_wire_names() {
        let json = r#"{
            "redirect_uris": ["https://app.example.com/cb"],
            "grant_types": ["authorization_code"],
            "response_types": ["code"],
            "application_type": "native",
            "subject_type": "pairwise",
            "token_endpoint_auth_method": "private_key_jwt",
            "backchannel_token_delivery_mode": "poll",
            "tls_client_auth_san_dns": ["client.example.com"]
        }"#;

        let request: ClientRegistrationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.redirect_uris, vec!["https://app.example.com/cb"]);
        assert_eq!(request.application_type, ApplicationType::Native);
        assert_eq!(request.subject_type, SubjectType::Pairwise);
        assert_eq!(
            request.token_endpoint_auth_method.as_deref(),
            Some("private_key_jwt")
        );
        assert_eq!(
            request.backchannel_token_delivery_mode.as_deref(),
            Some("poll")
        );
        assert!(request.has_tls_client_auth_metadata());
        assert!(!request.has_jwks());
    }

    #[test]
    fn application_and_subject_types_default() {
        let request: ClientRegistrationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.application_type, ApplicationType::Web);
        assert_eq!(request.subject_type, SubjectType::Public);
    }

    #[test]
    fn auth_method_roundtrips_as_str() {
        for method in [
            AuthMethod::ClientSecretBasic,
            AuthMethod::ClientSecretPost,
            AuthMethod::ClientSecretJwt,
            AuthMethod::PrivateKeyJwt,
            AuthMethod::TlsClientAuth,
            AuthMethod::SelfSignedTlsClientAuth,
            AuthMethod::None,
        ] {
            assert_eq!(method.as_str().parse::<AuthMethod>(), Ok(method));
        }
        assert!("client_secret_plain".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn secret_entry_expiry() {
        let now = Utc::now();
        let fresh = ClientSecret::sha256_of("s3cret");
        assert!(!fresh.is_expired(now));

        let expired = ClientSecret::sha256_of("s3cret")
            .expiring_at(now - chrono::Duration::seconds(1));
        assert!(expired.is_expired(now));
    }

    #[test]
    fn client_request_redacts_secret_in_debug() {
        let request = ClientRequest::new("https://op.example.com/token")
            .with_client_id("cid")
            .with_client_secret("hunter2");

        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(request.secret(), Some("hunter2"));
    }
}
