//! Backchannel authentication (CIBA) registration validation
//!
//! Delivery mode semantics:
//!
//! - `poll` is fully supported; a client notification endpoint must NOT be
//!   registered with it (the provider never calls back).
//! - `ping` and `push` require a notification endpoint; with one present
//!   they are still rejected as not supported — this provider only delivers
//!   via poll. The distinction keeps the two failure causes separately
//!   diagnosable for the registering developer.
//! - anything else is rejected outright.
//!
//! Independently of the mode, a declared CIBA request signing algorithm must
//! be in the provider's supported set.

use std::sync::Arc;

use async_trait::async_trait;

use crate::assertion::AssertionVerifier;
use crate::error::RegistrationError;
use crate::registration::algorithms::check_algorithm;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::ClientRegistrationRequest;

/// Validates CIBA delivery configuration.
pub struct BackChannelAuthenticationValidator {
    verifier: Arc<dyn AssertionVerifier>,
}

impl BackChannelAuthenticationValidator {
    /// Validator sourcing the signing-algorithm set from `verifier`.
    pub fn new(verifier: Arc<dyn AssertionVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl RegistrationValidator for BackChannelAuthenticationValidator {
    fn name(&self) -> &'static str {
        "backchannel_authentication"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        check_algorithm(
            request
                .backchannel_authentication_request_signing_alg
                .as_deref(),
            self.verifier.signing_algorithms_supported(),
            "backchannel_authentication_request_signing_alg",
        )?;

        let Some(mode) = request.backchannel_token_delivery_mode.as_deref() else {
            return Checked::ok();
        };

        let has_notification_endpoint = request
            .backchannel_client_notification_endpoint
            .is_some();

        match mode {
            "poll" => {
                if has_notification_endpoint {
                    return Err(RegistrationError::invalid_client_metadata(
                        "backchannel_client_notification_endpoint must not be provided with \
                         the poll delivery mode",
                    ));
                }
                Checked::ok()
            }
            "ping" | "push" => {
                if !has_notification_endpoint {
                    return Err(RegistrationError::invalid_request(
                        "a backchannel_client_notification_endpoint is required for the \
                         ping or push delivery modes",
                    ));
                }
                Err(RegistrationError::invalid_request(format!(
                    "the '{mode}' token delivery mode is not supported; only poll is supported"
                )))
            }
            other => Err(RegistrationError::invalid_request(format!(
                "unknown backchannel_token_delivery_mode '{other}'"
            ))),
        }
    }
}
