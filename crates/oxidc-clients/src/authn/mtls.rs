//! Mutual-TLS client authentication (RFC 8705)
//!
//! Two methods, one transport requirement: the TLS layer must have presented
//! a client certificate, which the enclosing endpoint hands over as
//! [`ClientCertificate`].
//!
//! - `tls_client_auth` trusts the CA that issued the certificate and binds
//!   the client to a registered identity: subject DN or a SAN entry. The
//!   binding comparison itself is the [`CertificateBinding`] collaborator;
//!   [`DnSanBinding`] is the standard implementation.
//! - `self_signed_tls_client_auth` trusts nothing but key possession: the
//!   certificate's public key must appear in the client's JWK set.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::authn::ClientAuthenticator;
use crate::cert::ClientCertificate;
use crate::dn;
use crate::store::{ClientKeysProvider, ClientStore};
use crate::types::{AuthMethod, ClientInfo, ClientRequest, TlsClientAuthMetadata};

/// Decides whether a presented certificate is the one a client registered.
pub trait CertificateBinding: Send + Sync {
    /// True when `certificate` matches `registered`.
    fn matches(&self, certificate: &ClientCertificate, registered: &TlsClientAuthMetadata)
    -> bool;
}

/// Standard RFC 8705 binding: the registered field decides the comparison.
///
/// Exactly one registered field is expected; when several are populated, the
/// first in DN, DNS, URI, IP, email order decides. DNs compare by RFC 4514
/// normalized form, DNS names case-insensitively, everything else verbatim.
pub struct DnSanBinding;

impl CertificateBinding for DnSanBinding {
    fn matches(
        &self,
        certificate: &ClientCertificate,
        registered: &TlsClientAuthMetadata,
    ) -> bool {
        if let Some(expected_dn) = &registered.subject_dn {
            let Some(presented_dn) = &certificate.subject_dn else {
                return false;
            };
            return match (dn::normalize(expected_dn), dn::normalize(presented_dn)) {
                (Ok(expected), Ok(presented)) => expected == presented,
                _ => false,
            };
        }
        if !registered.san_dns.is_empty() {
            return registered.san_dns.iter().any(|expected| {
                certificate
                    .san_dns
                    .iter()
                    .any(|presented| presented.eq_ignore_ascii_case(expected))
            });
        }
        if !registered.san_uri.is_empty() {
            return registered
                .san_uri
                .iter()
                .any(|expected| certificate.san_uri.contains(expected));
        }
        if !registered.san_ip.is_empty() {
            return registered
                .san_ip
                .iter()
                .any(|expected| certificate.san_ip.contains(expected));
        }
        if !registered.san_email.is_empty() {
            return registered
                .san_email
                .iter()
                .any(|expected| certificate.san_email.contains(expected));
        }
        false
    }
}

/// `tls_client_auth`: CA-issued certificate matched against registered
/// DN/SAN metadata.
pub struct TlsClientAuthenticator {
    store: Arc<dyn ClientStore>,
    binding: Arc<dyn CertificateBinding>,
    methods: [AuthMethod; 1],
}

impl TlsClientAuthenticator {
    /// Authenticator with the standard DN/SAN binding.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self::with_binding(store, Arc::new(DnSanBinding))
    }

    /// Authenticator with a custom binding comparison.
    pub fn with_binding(store: Arc<dyn ClientStore>, binding: Arc<dyn CertificateBinding>) -> Self {
        Self {
            store,
            binding,
            methods: [AuthMethod::TlsClientAuth],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for TlsClientAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        let certificate = request.certificate.as_ref()?;
        let client_id = request.client_id.as_deref().filter(|id| !id.trim().is_empty())?;

        let client = self.store.find_client(client_id).await?;
        if client.auth_method != AuthMethod::TlsClientAuth {
            return None;
        }
        let Some(registered) = &client.tls_client_auth else {
            debug!(client_id = %client_id, "Client has no certificate binding metadata");
            return None;
        };

        if self.binding.matches(certificate, registered) {
            Some(client)
        } else {
            debug!(client_id = %client_id, "Presented certificate does not match the registered identity");
            None
        }
    }
}

/// `self_signed_tls_client_auth`: certificate matched by public key against
/// the client's JWK set.
pub struct SelfSignedTlsClientAuthenticator {
    store: Arc<dyn ClientStore>,
    keys: Arc<dyn ClientKeysProvider>,
    methods: [AuthMethod; 1],
}

impl SelfSignedTlsClientAuthenticator {
    /// Authenticator resolving client keys through `keys`.
    pub fn new(store: Arc<dyn ClientStore>, keys: Arc<dyn ClientKeysProvider>) -> Self {
        Self {
            store,
            keys,
            methods: [AuthMethod::SelfSignedTlsClientAuth],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for SelfSignedTlsClientAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        let certificate = request.certificate.as_ref()?;
        let client_id = request.client_id.as_deref().filter(|id| !id.trim().is_empty())?;

        let client = self.store.find_client(client_id).await?;
        if client.auth_method != AuthMethod::SelfSignedTlsClientAuth {
            return None;
        }

        let keys = self.keys.signing_keys(&client).await.ok()?;
        if keys.is_empty() {
            debug!(client_id = %client_id, "Client has no keys to match the certificate against");
            return None;
        }

        // First match in set order wins; there is no preference ordering
        // beyond that.
        if keys.iter().any(|jwk| certificate.matches_key(jwk)) {
            Some(client)
        } else {
            debug!(client_id = %client_id, "Certificate public key not present in the client's JWK set");
            None
        }
    }
}
