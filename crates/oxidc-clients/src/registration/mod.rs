//! Dynamic client registration validation (RFC 7591)
//!
//! A registration request passes through an ordered pipeline of leaf
//! validators, each checking one slice of the request. The pipeline stops at
//! the first error — the caller gets exactly one deterministic error per
//! invalid request, and downstream validators (some of which perform network
//! I/O) never run for a request that is already dead.
//!
//! Validators do not share mutable state. The one piece of derived data — the
//! pairwise sector identifier — travels in each validator's [`Checked`]
//! outcome and is folded into the immutable [`ValidatedRegistration`] after
//! every validator has passed.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oxidc_clients::assertion::{JwtAssertionVerifier, StaticResponseSigningKeys};
//! use oxidc_clients::fetch::HttpMetadataFetcher;
//! use oxidc_clients::registration::RegistrationPipeline;
//! use oxidc_clients::store::InMemoryClientStore;
//! use oxidc_clients::types::{AuthMethod, ClientRegistrationRequest};
//!
//! # async fn example() {
//! let pipeline = RegistrationPipeline::standard(
//!     Arc::new(JwtAssertionVerifier::new()),
//!     Arc::new(StaticResponseSigningKeys::new(["RS256", "ES256"])),
//!     Arc::new(HttpMetadataFetcher::new()),
//!     Arc::new(InMemoryClientStore::new()),
//!     vec![AuthMethod::ClientSecretBasic, AuthMethod::None],
//! );
//!
//! let request = ClientRegistrationRequest {
//!     redirect_uris: vec!["https://app.example.com/cb".into()],
//!     grant_types: vec!["authorization_code".into()],
//!     response_types: vec!["code".into()],
//!     ..Default::default()
//! };
//!
//! match pipeline.validate(&request).await {
//!     Ok(validated) => println!("registered, sector: {:?}", validated.sector_identifier),
//!     Err(error) => println!("rejected: {error}"),
//! }
//! # }
//! ```

mod algorithms;
mod ciba;
mod client;
mod credentials;
mod grant_types;
mod redirect_uris;
mod subject_type;
mod tls_metadata;

pub use algorithms::{SignedResponseAlgorithmsValidator, SigningAlgorithmsValidator};
pub use ciba::BackChannelAuthenticationValidator;
pub use client::{ClientIdValidator, InitiateLoginUriValidator, TokenEndpointAuthMethodValidator};
pub use credentials::CredentialsValidator;
pub use grant_types::GrantTypeValidator;
pub use redirect_uris::{PostLogoutRedirectUrisValidator, RedirectUrisValidator};
pub use subject_type::SubjectTypeValidator;
pub use tls_metadata::TlsClientAuthValidator;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::assertion::{AssertionVerifier, ResponseSigningKeys};
use crate::error::RegistrationError;
use crate::fetch::MetadataFetcher;
use crate::store::ClientStore;
use crate::types::{AuthMethod, ClientRegistrationRequest};

/// A passing validator's outcome.
///
/// Almost always empty; the subject-type validator contributes the derived
/// pairwise sector identifier here.
#[derive(Debug, Clone, Default)]
pub struct Checked {
    /// Sector identifier derived from the request, when applicable.
    pub sector_identifier: Option<String>,
}

impl Checked {
    /// A plain pass.
    pub fn ok() -> Result<Self, RegistrationError> {
        Ok(Self::default())
    }

    /// A pass that derived a sector identifier.
    pub fn with_sector_identifier(sector_identifier: impl Into<String>) -> Self {
        Self {
            sector_identifier: Some(sector_identifier.into()),
        }
    }
}

/// One slice of registration validation.
///
/// Implementations are independent of each other and free of side effects;
/// any of them may await injected collaborators (store lookups, document
/// fetches).
#[async_trait]
pub trait RegistrationValidator: Send + Sync {
    /// Validator name for logs.
    fn name(&self) -> &'static str;

    /// Check one slice of `request`.
    ///
    /// # Errors
    ///
    /// Returns the structured [`RegistrationError`] this slice's rules
    /// produce; the pipeline propagates it verbatim.
    async fn check(&self, request: &ClientRegistrationRequest)
    -> Result<Checked, RegistrationError>;
}

/// The accepted registration: the request plus derived data.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    /// The request exactly as validated.
    pub request: ClientRegistrationRequest,
    /// Sector identifier for pairwise subject derivation, when the request
    /// uses pairwise subjects.
    pub sector_identifier: Option<String>,
}

/// Ordered validator pipeline with stop-on-first-error semantics.
pub struct RegistrationPipeline {
    validators: Vec<Arc<dyn RegistrationValidator>>,
}

impl RegistrationPipeline {
    /// Build a pipeline running `validators` in the given order.
    pub fn new(validators: Vec<Arc<dyn RegistrationValidator>>) -> Self {
        Self { validators }
    }

    /// The canonical pipeline: every validator this module defines, wired to
    /// the given collaborators, in the canonical order.
    ///
    /// `supported_auth_methods` is normally the authenticator chain's
    /// advertised method set.
    pub fn standard(
        assertion_verifier: Arc<dyn AssertionVerifier>,
        response_signing: Arc<dyn ResponseSigningKeys>,
        fetcher: Arc<dyn MetadataFetcher>,
        store: Arc<dyn ClientStore>,
        supported_auth_methods: Vec<AuthMethod>,
    ) -> Self {
        Self::new(vec![
            Arc::new(RedirectUrisValidator),
            Arc::new(PostLogoutRedirectUrisValidator),
            Arc::new(GrantTypeValidator),
            Arc::new(SigningAlgorithmsValidator::new(assertion_verifier.clone())),
            Arc::new(SignedResponseAlgorithmsValidator::new(response_signing)),
            Arc::new(SubjectTypeValidator::new(fetcher)),
            Arc::new(TlsClientAuthValidator),
            Arc::new(BackChannelAuthenticationValidator::new(assertion_verifier)),
            Arc::new(InitiateLoginUriValidator),
            Arc::new(TokenEndpointAuthMethodValidator::new(
                supported_auth_methods,
            )),
            Arc::new(ClientIdValidator::new(store)),
            Arc::new(CredentialsValidator),
        ])
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first validator's error; later validators are not
    /// evaluated.
    pub async fn validate(
        &self,
        request: &ClientRegistrationRequest,
    ) -> Result<ValidatedRegistration, RegistrationError> {
        let mut sector_identifier = None;
        for validator in &self.validators {
            match validator.check(request).await {
                Ok(checked) => {
                    if checked.sector_identifier.is_some() {
                        sector_identifier = checked.sector_identifier;
                    }
                }
                Err(error) => {
                    debug!(
                        validator = validator.name(),
                        code = %error.code,
                        "Registration request rejected"
                    );
                    return Err(error);
                }
            }
        }

        Ok(ValidatedRegistration {
            request: request.clone(),
            sector_identifier,
        })
    }
}
