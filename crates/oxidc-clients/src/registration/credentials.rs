//! Auth-method / credential consistency
//!
//! A registration that names an auth method must also carry the credential
//! material that method verifies against:
//!
//! - `private_key_jwt` and `client_secret_jwt` need a JWK set, inline or by
//!   reference;
//! - `tls_client_auth` needs certificate-binding metadata;
//! - `self_signed_tls_client_auth` needs binding metadata or a JWK set (the
//!   set conveys the certificate's key).
//!
//! A JWK set on any other method is fine — clients use keys for request
//! object signing and response encryption independently of how they
//! authenticate.

use async_trait::async_trait;

use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::ClientRegistrationRequest;

/// Cross-checks the requested auth method against the supplied credentials.
pub struct CredentialsValidator;

#[async_trait]
impl RegistrationValidator for CredentialsValidator {
    fn name(&self) -> &'static str {
        "credentials"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        // Unknown method strings were already rejected by the auth-method
        // validator; anything unrecognized here carries no constraint.
        match request.token_endpoint_auth_method.as_deref() {
            Some(method @ ("private_key_jwt" | "client_secret_jwt")) => {
                if !request.has_jwks() {
                    return Err(RegistrationError::invalid_client_metadata(format!(
                        "{method} requires a JWK set, provided inline as jwks or by \
                         reference as jwks_uri"
                    )));
                }
            }
            Some("tls_client_auth") => {
                if !request.has_tls_client_auth_metadata() {
                    return Err(RegistrationError::invalid_client_metadata(
                        "tls_client_auth requires certificate binding metadata \
                         (tls_client_auth_subject_dn or a tls_client_auth_san_* field)",
                    ));
                }
            }
            Some("self_signed_tls_client_auth") => {
                if !request.has_tls_client_auth_metadata() && !request.has_jwks() {
                    return Err(RegistrationError::invalid_client_metadata(
                        "self_signed_tls_client_auth requires certificate binding metadata \
                         or a JWK set conveying the certificate",
                    ));
                }
            }
            _ => {}
        }
        Checked::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::jwk::JwkSet;

    fn jwks() -> JwkSet {
        serde_json::from_value(serde_json::json!({
            "keys": [{"kty": "oct", "k": "c2VjcmV0"}]
        }))
        .unwrap()
    }

    fn with_method(method: &str) -> ClientRegistrationRequest {
        ClientRegistrationRequest {
            token_endpoint_auth_method: Some(method.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn assertion_methods_require_a_jwk_set() {
        for method in ["private_key_jwt", "client_secret_jwt"] {
            let bare = with_method(method);
            let error = CredentialsValidator.check(&bare).await.unwrap_err();
            assert!(error.description.contains(method), "{method}");

            let mut inline = with_method(method);
            inline.jwks = Some(jwks());
            assert!(CredentialsValidator.check(&inline).await.is_ok());

            let mut by_reference = with_method(method);
            by_reference.jwks_uri = Some("https://client.example.com/jwks.json".to_string());
            assert!(CredentialsValidator.check(&by_reference).await.is_ok());
        }
    }

    #[tokio::test]
    async fn tls_client_auth_requires_binding_metadata() {
        let bare = with_method("tls_client_auth");
        assert!(CredentialsValidator.check(&bare).await.is_err());

        let mut with_dn = with_method("tls_client_auth");
        with_dn.tls_client_auth_subject_dn = Some("CN=client.example.com".to_string());
        assert!(CredentialsValidator.check(&with_dn).await.is_ok());
    }

    #[tokio::test]
    async fn self_signed_accepts_either_credential_shape() {
        let bare = with_method("self_signed_tls_client_auth");
        assert!(CredentialsValidator.check(&bare).await.is_err());

        let mut with_san = with_method("self_signed_tls_client_auth");
        with_san.tls_client_auth_san_dns = vec!["client.example.com".to_string()];
        assert!(CredentialsValidator.check(&with_san).await.is_ok());

        let mut with_keys = with_method("self_signed_tls_client_auth");
        with_keys.jwks = Some(jwks());
        assert!(CredentialsValidator.check(&with_keys).await.is_ok());
    }

    #[tokio::test]
    async fn jwks_is_allowed_for_any_method() {
        let mut request = with_method("none");
        request.jwks = Some(jwks());
        assert!(CredentialsValidator.check(&request).await.is_ok());

        let mut request = with_method("client_secret_basic");
        request.jwks_uri = Some("https://client.example.com/jwks.json".to_string());
        assert!(CredentialsValidator.check(&request).await.is_ok());
    }

    #[tokio::test]
    async fn absent_method_carries_no_constraint() {
        assert!(
            CredentialsValidator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );
    }
}
