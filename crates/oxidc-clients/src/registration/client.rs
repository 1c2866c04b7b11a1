//! Scalar client metadata checks
//!
//! Three small validators: the third-party login initiation URI, the
//! requested token endpoint auth method against what the runtime actually
//! supports, and client-proposed id uniqueness.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::store::ClientStore;
use crate::types::{AuthMethod, ClientRegistrationRequest};
use crate::uri;

/// Validates `initiate_login_uri`: if present, absolute and https.
pub struct InitiateLoginUriValidator;

#[async_trait]
impl RegistrationValidator for InitiateLoginUriValidator {
    fn name(&self) -> &'static str {
        "initiate_login_uri"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        if let Some(raw) = &request.initiate_login_uri {
            let valid = uri::parse_absolute(raw).is_some_and(|url| uri::is_https(&url));
            if !valid {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "initiate_login_uri '{raw}' must be an absolute https URI"
                )));
            }
        }
        Checked::ok()
    }
}

/// Validates the requested `token_endpoint_auth_method` against the
/// authenticator chain's advertised method set.
pub struct TokenEndpointAuthMethodValidator {
    supported: Vec<AuthMethod>,
}

impl TokenEndpointAuthMethodValidator {
    /// Validator accepting exactly `supported` (normally the chain's
    /// advertised set; duplicates are harmless).
    pub fn new(supported: Vec<AuthMethod>) -> Self {
        Self { supported }
    }
}

#[async_trait]
impl RegistrationValidator for TokenEndpointAuthMethodValidator {
    fn name(&self) -> &'static str {
        "token_endpoint_auth_method"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        if let Some(method) = request.token_endpoint_auth_method.as_deref() {
            let supported = self
                .supported
                .iter()
                .any(|candidate| candidate.as_str() == method);
            if !supported {
                return Err(RegistrationError::invalid_client_metadata(format!(
                    "token_endpoint_auth_method '{method}' is not supported"
                )));
            }
        }
        Checked::ok()
    }
}

/// Rejects a client-proposed `client_id` that is already registered.
pub struct ClientIdValidator {
    store: Arc<dyn ClientStore>,
}

impl ClientIdValidator {
    /// Validator checking uniqueness against `store`.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RegistrationValidator for ClientIdValidator {
    fn name(&self) -> &'static str {
        "client_id"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        if let Some(client_id) = request.client_id.as_deref()
            && !client_id.trim().is_empty()
            && self.store.find_client(client_id).await.is_some()
        {
            return Err(RegistrationError::invalid_client_metadata(format!(
                "client_id '{client_id}' is already registered"
            )));
        }
        Checked::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryClientStore;
    use crate::types::ClientInfo;

    #[tokio::test]
    async fn initiate_login_uri_requires_absolute_https() {
        let validator = InitiateLoginUriValidator;

        assert!(
            validator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );

        let ok = ClientRegistrationRequest {
            initiate_login_uri: Some("https://app.example.com/login".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&ok).await.is_ok());

        for bad in ["http://app.example.com/login", "/login"] {
            let request = ClientRegistrationRequest {
                initiate_login_uri: Some(bad.to_string()),
                ..Default::default()
            };
            assert!(validator.check(&request).await.is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn auth_method_must_be_in_supported_set() {
        let validator = TokenEndpointAuthMethodValidator::new(vec![
            AuthMethod::ClientSecretBasic,
            AuthMethod::None,
        ]);

        let ok = ClientRegistrationRequest {
            token_endpoint_auth_method: Some("client_secret_basic".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&ok).await.is_ok());

        let unsupported = ClientRegistrationRequest {
            token_endpoint_auth_method: Some("private_key_jwt".to_string()),
            ..Default::default()
        };
        let error = validator.check(&unsupported).await.unwrap_err();
        assert!(error.description.contains("private_key_jwt"));

        let unknown = ClientRegistrationRequest {
            token_endpoint_auth_method: Some("client_secret_plain".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&unknown).await.is_err());
    }

    #[tokio::test]
    async fn absent_auth_method_passes() {
        let validator = TokenEndpointAuthMethodValidator::new(vec![AuthMethod::None]);
        assert!(
            validator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn duplicate_client_id_rejected() {
        let store = Arc::new(InMemoryClientStore::new());
        store.insert(ClientInfo::public("taken"));
        let validator = ClientIdValidator::new(store);

        let fresh = ClientRegistrationRequest {
            client_id: Some("fresh".to_string()),
            ..Default::default()
        };
        assert!(validator.check(&fresh).await.is_ok());

        let taken = ClientRegistrationRequest {
            client_id: Some("taken".to_string()),
            ..Default::default()
        };
        let error = validator.check(&taken).await.unwrap_err();
        assert!(error.description.contains("already registered"));

        assert!(
            validator
                .check(&ClientRegistrationRequest::default())
                .await
                .is_ok()
        );
    }
}
