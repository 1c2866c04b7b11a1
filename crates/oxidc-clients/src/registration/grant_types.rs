//! Grant type / response type coherence
//!
//! Each declared response type implies a grant type the client must also
//! declare: `code` needs `authorization_code`, `token` and `id_token` need
//! `implicit`. Unlike the per-URI checks, this validator reports every
//! missing grant type in one message — a client fixing its registration
//! should not have to round-trip once per missing entry.

use async_trait::async_trait;

use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::ClientRegistrationRequest;

/// Validates that `grant_types` covers what `response_types` requires.
pub struct GrantTypeValidator;

/// Grant types implied by the individual response type components.
fn required_grant_types(response_types: &[String]) -> Vec<&'static str> {
    let mut required = Vec::new();
    // Compound response types ("code id_token") imply every component's
    // grant.
    for component in response_types
        .iter()
        .flat_map(|response_type| response_type.split_ascii_whitespace())
    {
        let implied = match component {
            "code" => Some("authorization_code"),
            "token" | "id_token" => Some("implicit"),
            _ => None,
        };
        if let Some(grant) = implied
            && !required.contains(&grant)
        {
            required.push(grant);
        }
    }
    required
}

#[async_trait]
impl RegistrationValidator for GrantTypeValidator {
    fn name(&self) -> &'static str {
        "grant_types"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        let missing: Vec<&str> = required_grant_types(&request.response_types)
            .into_iter()
            .filter(|grant| !request.grant_types.iter().any(|declared| declared == grant))
            .collect();

        if missing.is_empty() {
            Checked::ok()
        } else {
            Err(RegistrationError::invalid_client_metadata(format!(
                "the declared response types require the following grant types: {}",
                missing.join(", ")
            )))
        }
    }
}
