//! RFC 8705 certificate-binding metadata validation
//!
//! A `tls_client_auth` client must register the certificate identity it will
//! present: a subject DN or one of the SAN entry kinds. Each category has its
//! own well-formedness rules; the first failing category (in DN, DNS, URI,
//! IP, email order) produces the error.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::dn;
use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::ClientRegistrationRequest;
use crate::uri;

/// Validates `tls_client_auth_*` metadata. Applies only when the requested
/// auth method is `tls_client_auth`.
pub struct TlsClientAuthValidator;

#[async_trait]
impl RegistrationValidator for TlsClientAuthValidator {
    fn name(&self) -> &'static str {
        "tls_client_auth_metadata"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        if request.token_endpoint_auth_method.as_deref() != Some("tls_client_auth") {
            return Checked::ok();
        }

        if !request.has_tls_client_auth_metadata() {
            return Err(RegistrationError::invalid_client_metadata(
                "tls_client_auth requires at least one of tls_client_auth_subject_dn, \
                 tls_client_auth_san_dns, tls_client_auth_san_uri, tls_client_auth_san_ip, \
                 or tls_client_auth_san_email",
            ));
        }

        if let Some(subject_dn) = &request.tls_client_auth_subject_dn
            && dn::parse(subject_dn).is_err()
        {
            return Err(RegistrationError::invalid_client_metadata(format!(
                "tls_client_auth_subject_dn '{subject_dn}' is not a valid RFC 4514 \
                 distinguished name"
            )));
        }

        for entry in &request.tls_client_auth_san_dns {
            if entry.is_empty() || entry.chars().any(char::is_whitespace) {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "tls_client_auth_san_dns entry '{entry}' must be a non-empty DNS name \
                     without whitespace"
                )));
            }
        }

        for entry in &request.tls_client_auth_san_uri {
            if uri::parse_absolute(entry).is_none() {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "tls_client_auth_san_uri entry '{entry}' must be an absolute URI"
                )));
            }
        }

        for entry in &request.tls_client_auth_san_ip {
            if entry.parse::<IpAddr>().is_err() {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "tls_client_auth_san_ip entry '{entry}' must be an IPv4 or IPv6 address"
                )));
            }
        }

        for entry in &request.tls_client_auth_san_email {
            if entry.is_empty() || !entry.contains('@') {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "tls_client_auth_san_email entry '{entry}' must be an email address"
                )));
            }
        }

        Checked::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls_request() -> ClientRegistrationRequest {
        ClientRegistrationRequest {
            token_endpoint_auth_method: Some("tls_client_auth".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn other_auth_methods_skip_the_check() {
        let request = ClientRegistrationRequest {
            token_endpoint_auth_method: Some("client_secret_basic".to_string()),
            ..Default::default()
        };
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());
        assert!(
            TlsClientAuthValidator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn some_binding_metadata_is_required() {
        let error = TlsClientAuthValidator
            .check(&tls_request())
            .await
            .unwrap_err();
        assert!(error.description.contains("at least one"));
    }

    #[tokio::test]
    async fn subject_dn_must_parse_as_rfc4514() {
        let mut request = tls_request();
        request.tls_client_auth_subject_dn = Some("CN=client.example.com,O=Example".to_string());
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());

        request.tls_client_auth_subject_dn = Some("not a valid DN format!@#".to_string());
        let error = TlsClientAuthValidator.check(&request).await.unwrap_err();
        assert!(error.description.contains("RFC 4514"));
    }

    #[tokio::test]
    async fn san_dns_entries_must_be_clean() {
        let mut request = tls_request();
        request.tls_client_auth_san_dns = vec!["client.example.com".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());

        request.tls_client_auth_san_dns = vec!["has space.example.com".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_err());

        request.tls_client_auth_san_dns = vec![String::new()];
        assert!(TlsClientAuthValidator.check(&request).await.is_err());
    }

    #[tokio::test]
    async fn san_uri_entries_must_be_absolute() {
        let mut request = tls_request();
        request.tls_client_auth_san_uri = vec!["https://client.example.com/id".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());

        request.tls_client_auth_san_uri = vec!["/relative".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_err());
    }

    #[tokio::test]
    async fn san_ip_entries_must_parse() {
        let mut request = tls_request();
        request.tls_client_auth_san_ip = vec!["192.0.2.7".to_string(), "2001:db8::1".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());

        request.tls_client_auth_san_ip = vec!["999.0.0.1".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_err());
    }

    #[tokio::test]
    async fn san_email_entries_need_an_at_sign() {
        let mut request = tls_request();
        request.tls_client_auth_san_email = vec!["ops@example.com".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_ok());

        request.tls_client_auth_san_email = vec!["not-an-address".to_string()];
        assert!(TlsClientAuthValidator.check(&request).await.is_err());
    }

    #[tokio::test]
    async fn first_failing_category_wins() {
        let mut request = tls_request();
        request.tls_client_auth_subject_dn = Some("broken!".to_string());
        request.tls_client_auth_san_email = vec!["also-broken".to_string()];

        let error = TlsClientAuthValidator.check(&request).await.unwrap_err();
        assert!(error.description.contains("RFC 4514"));
    }
}
