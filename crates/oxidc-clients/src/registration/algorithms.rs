//! Declared algorithm validation
//!
//! Clients declare the JOSE algorithms they intend to sign with (request
//! objects, CIBA requests, token-endpoint auth JWTs) and the algorithms they
//! expect responses signed with (ID Token, UserInfo). Every declared value
//! must be in the matching provider capability set, by exact case-sensitive
//! comparison — `rs256` is not `RS256`. `none` is only acceptable when the
//! capability set explicitly lists it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::assertion::{AssertionVerifier, ResponseSigningKeys};
use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::ClientRegistrationRequest;

pub(crate) fn check_algorithm(
    declared: Option<&str>,
    supported: &[String],
    field: &str,
) -> Result<(), RegistrationError> {
    match declared {
        None => Ok(()),
        Some(algorithm) if supported.iter().any(|name| name == algorithm) => Ok(()),
        Some(algorithm) => Err(RegistrationError::invalid_request(format!(
            "signing algorithm '{algorithm}' is not supported for {field}"
        ))),
    }
}

/// Validates the inbound-JWT signing algorithm declarations against the
/// assertion verifier's supported set.
pub struct SigningAlgorithmsValidator {
    verifier: Arc<dyn AssertionVerifier>,
}

impl SigningAlgorithmsValidator {
    /// Validator sourcing its supported set from `verifier`.
    pub fn new(verifier: Arc<dyn AssertionVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl RegistrationValidator for SigningAlgorithmsValidator {
    fn name(&self) -> &'static str {
        "signing_algorithms"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        let supported = self.verifier.signing_algorithms_supported();
        check_algorithm(
            request.request_object_signing_alg.as_deref(),
            supported,
            "request_object_signing_alg",
        )?;
        check_algorithm(
            request
                .backchannel_authentication_request_signing_alg
                .as_deref(),
            supported,
            "backchannel_authentication_request_signing_alg",
        )?;
        check_algorithm(
            request.token_endpoint_auth_signing_alg.as_deref(),
            supported,
            "token_endpoint_auth_signing_alg",
        )?;
        Checked::ok()
    }
}

/// Validates the signed-response algorithm declarations against the
/// provider's signing capability.
pub struct SignedResponseAlgorithmsValidator {
    signing: Arc<dyn ResponseSigningKeys>,
}

impl SignedResponseAlgorithmsValidator {
    /// Validator sourcing its supported set from `signing`.
    pub fn new(signing: Arc<dyn ResponseSigningKeys>) -> Self {
        Self { signing }
    }
}

#[async_trait]
impl RegistrationValidator for SignedResponseAlgorithmsValidator {
    fn name(&self) -> &'static str {
        "signed_response_algorithms"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        let supported = self.signing.signed_response_algorithms_supported();
        check_algorithm(
            request.id_token_signed_response_alg.as_deref(),
            supported,
            "id_token_signed_response_alg",
        )?;
        check_algorithm(
            request.userinfo_signed_response_alg.as_deref(),
            supported,
            "userinfo_signed_response_alg",
        )?;
        Checked::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{JwtAssertionVerifier, StaticResponseSigningKeys};
    use crate::error::RegistrationErrorCode;

    #[tokio::test]
    async fn undeclared_algorithms_pass() {
        let validator = SigningAlgorithmsValidator::new(Arc::new(JwtAssertionVerifier::new()));
        assert!(
            validator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn supported_algorithm_passes_unsupported_fails() {
        let validator = SigningAlgorithmsValidator::new(Arc::new(JwtAssertionVerifier::new()));

        let request = ClientRegistrationRequest {
            request_object_signing_alg: Some("RS256".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&request).await.is_ok());

        let request = ClientRegistrationRequest {
            token_endpoint_auth_signing_alg: Some("XS999".to_string()),
            ..Default::default()
        };
        let error = validator.check(&request).await.unwrap_err();
        assert_eq!(error.code, RegistrationErrorCode::InvalidRequest);
        assert!(error.description.contains("XS999"));
        assert!(error.description.contains("token_endpoint_auth_signing_alg"));
    }

    #[tokio::test]
    async fn matching_is_case_sensitive() {
        let validator = SigningAlgorithmsValidator::new(Arc::new(JwtAssertionVerifier::new()));
        let request = ClientRegistrationRequest {
            request_object_signing_alg: Some("rs256".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&request).await.is_err());
    }

    #[tokio::test]
    async fn none_requires_explicit_support() {
        let rejecting =
            SignedResponseAlgorithmsValidator::new(Arc::new(StaticResponseSigningKeys::new([
                "RS256",
            ])));
        let accepting =
            SignedResponseAlgorithmsValidator::new(Arc::new(StaticResponseSigningKeys::new([
                "RS256", "none",
            ])));

        let request = ClientRegistrationRequest {
            id_token_signed_response_alg: Some("none".to_string()),
            ..Default::default()
        };
        assert!(rejecting.check(&request).await.is_err());
        assert!(accepting.check(&request).await.is_ok());
    }

    #[tokio::test]
    async fn userinfo_algorithm_checked_against_signing_set() {
        let validator =
            SignedResponseAlgorithmsValidator::new(Arc::new(StaticResponseSigningKeys::new([
                "ES256",
            ])));
        let request = ClientRegistrationRequest {
            userinfo_signed_response_alg: Some("RS256".to_string()),
            ..Default::default()
        };
        let error = validator.check(&request).await.unwrap_err();
        assert!(error.description.contains("userinfo_signed_response_alg"));
    }
}
