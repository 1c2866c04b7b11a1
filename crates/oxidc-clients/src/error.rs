//! Registration error taxonomy
//!
//! Dynamic client registration reports failures as an `(error, error_description)`
//! pair per RFC 7591 Section 3.2.2, serialized with the RFC 6749 Section 5.2
//! field names. The code set is closed; descriptions are free-form and verbose
//! on purpose (they aid legitimate client developers).
//!
//! Client *authentication* failures never use this type: authenticators decline
//! silently so that nothing about the failing credential leaks to the caller.

use serde::{Deserialize, Serialize};

/// Closed set of registration error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationErrorCode {
    /// A redirect URI (or post-logout redirect URI) violates shape, scheme, or
    /// host rules.
    InvalidRedirectUri,
    /// Structurally invalid registration metadata: missing required fields,
    /// inconsistent auth-method/credential combinations, bad pairwise sector
    /// setup.
    InvalidClientMetadata,
    /// The request asks for something the provider does not support
    /// (algorithm, delivery mode).
    InvalidRequest,
}

impl RegistrationErrorCode {
    /// Wire representation of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRedirectUri => "invalid_redirect_uri",
            Self::InvalidClientMetadata => "invalid_client_metadata",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for RegistrationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured registration failure.
///
/// Created by exactly one leaf validator per rejected request and propagated
/// verbatim by the pipeline. Serializes to the RFC 6749 Section 5.2 error JSON
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {description}")]
pub struct RegistrationError {
    /// Error code.
    #[serde(rename = "error")]
    pub code: RegistrationErrorCode,
    /// Human-readable description of what was wrong.
    #[serde(rename = "error_description")]
    pub description: String,
}

impl RegistrationError {
    /// Build an `invalid_redirect_uri` error.
    pub fn invalid_redirect_uri(description: impl Into<String>) -> Self {
        Self {
            code: RegistrationErrorCode::InvalidRedirectUri,
            description: description.into(),
        }
    }

    /// Build an `invalid_client_metadata` error.
    pub fn invalid_client_metadata(description: impl Into<String>) -> Self {
        Self {
            code: RegistrationErrorCode::InvalidClientMetadata,
            description: description.into(),
        }
    }

    /// Build an `invalid_request` error.
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self {
            code: RegistrationErrorCode::InvalidRequest,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_rfc6749_error_shape() {
        let error = RegistrationError::invalid_redirect_uri("fragment not allowed");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["error"], "invalid_redirect_uri");
        assert_eq!(json["error_description"], "fragment not allowed");
    }

    #[test]
    fn display_includes_code_and_description() {
        let error = RegistrationError::invalid_request("unsupported delivery mode");
        assert_eq!(
            error.to_string(),
            "invalid_request: unsupported delivery mode"
        );
    }

    #[test]
    fn code_roundtrips_through_serde() {
        for code in [
            RegistrationErrorCode::InvalidRedirectUri,
            RegistrationErrorCode::InvalidClientMetadata,
            RegistrationErrorCode::InvalidRequest,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: RegistrationErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }
}
