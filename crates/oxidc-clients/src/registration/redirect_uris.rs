//! Redirect URI validation
//!
//! Redirect URIs are the highest-value target in a registration request: an
//! attacker who can register a URI they control receives authorization codes
//! and tokens. The rules (RFC 8252 for native apps, OIDC registration for
//! web apps):
//!
//! - every URI absolute, no fragment
//! - web clients: https, host not localhost/loopback
//! - native clients: http only on localhost/loopback, https never, custom
//!   schemes freely

use async_trait::async_trait;

use crate::error::RegistrationError;
use crate::registration::{Checked, RegistrationValidator};
use crate::types::{ApplicationType, ClientRegistrationRequest};
use crate::uri;

/// Grant types that deliver through a redirect URI.
const REDIRECT_GRANT_TYPES: [&str; 3] = ["authorization_code", "implicit", "refresh_token"];

/// Check one redirect URI against the application-type rules.
pub(crate) fn check_redirect_uri(
    raw: &str,
    application_type: ApplicationType,
    field: &str,
) -> Result<(), RegistrationError> {
    let Some(url) = uri::parse_absolute(raw) else {
        return Err(RegistrationError::invalid_redirect_uri(format!(
            "{field} '{raw}' must be an absolute URI"
        )));
    };

    if url.fragment().is_some() {
        return Err(RegistrationError::invalid_redirect_uri(format!(
            "{field} '{raw}' must not contain a fragment"
        )));
    }

    match application_type {
        ApplicationType::Web => {
            if !uri::is_https(&url) {
                return Err(RegistrationError::invalid_redirect_uri(format!(
                    "{field} '{raw}' must use the https scheme for web clients"
                )));
            }
            if uri::has_loopback_host(&url) {
                return Err(RegistrationError::invalid_redirect_uri(format!(
                    "{field} '{raw}' must not point at localhost for web clients"
                )));
            }
            Ok(())
        }
        ApplicationType::Native => match url.scheme() {
            "http" => {
                if uri::has_loopback_host(&url) {
                    Ok(())
                } else {
                    Err(RegistrationError::invalid_redirect_uri(format!(
                        "{field} '{raw}' may use http only with a localhost host for native clients"
                    )))
                }
            }
            "https" => Err(RegistrationError::invalid_redirect_uri(format!(
                "{field} '{raw}' must not use https for native clients; use a custom scheme or loopback http"
            ))),
            // Custom schemes are the native-app norm (RFC 8252 Section 7.1).
            _ => Ok(()),
        },
    }
}

/// Validates `redirect_uris`.
pub struct RedirectUrisValidator;

#[async_trait]
impl RegistrationValidator for RedirectUrisValidator {
    fn name(&self) -> &'static str {
        "redirect_uris"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        let needs_redirect = request
            .grant_types
            .iter()
            .any(|grant| REDIRECT_GRANT_TYPES.contains(&grant.as_str()));

        if needs_redirect && request.redirect_uris.is_empty() {
            return Err(RegistrationError::invalid_client_metadata(
                "at least one redirect_uri is required for the requested grant types",
            ));
        }

        for raw in &request.redirect_uris {
            check_redirect_uri(raw, request.application_type, "redirect_uri")?;
        }
        Checked::ok()
    }
}

/// Validates `post_logout_redirect_uris` with the same per-URI rules; an
/// empty list is always valid.
pub struct PostLogoutRedirectUrisValidator;

#[async_trait]
impl RegistrationValidator for PostLogoutRedirectUrisValidator {
    fn name(&self) -> &'static str {
        "post_logout_redirect_uris"
    }

    async fn check(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<Checked, RegistrationError> {
        for raw in &request.post_logout_redirect_uris {
            check_redirect_uri(raw, request.application_type, "post_logout_redirect_uri")?;
        }
        Checked::ok()
    }
}
