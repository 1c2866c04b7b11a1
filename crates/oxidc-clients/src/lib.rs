//! # OxIDC Clients - Registration & Authentication for OIDC Providers
//!
//! Provider-side dynamic client registration (RFC 7591) and token endpoint
//! client authentication for OpenID Connect / OAuth 2.0 authorization
//! servers.
//!
//! ## Design Principles
//!
//! - **First signal wins**: the registration pipeline returns exactly one
//!   deterministic error per invalid request; the authenticator chain
//!   returns exactly one verified client per request. Neither aggregates.
//! - **Silent authentication failure**: authenticators decline with `None`,
//!   never with a reason — failure detail goes to debug logs, not attackers.
//! - **Injected collaborators**: stores, fetchers, verifiers, and the replay
//!   registry are traits; in-memory and `reqwest`-backed defaults ship in
//!   the crate.
//! - **Return, don't throw**: every business-rule failure is a returned
//!   value; nothing in the request path panics on user input.
//!
//! ## Architecture
//!
//! - [`types`] - Request/record model (RFC 7591 DTO, `ClientInfo`,
//!   `ClientRequest`)
//! - [`error`] - Registration error taxonomy (RFC 6749 Section 5.2 shape)
//! - [`registration`] - Validator pipeline for registration requests
//! - [`authn`] - Client authenticators and the first-match chain
//! - [`assertion`] - JWT client assertion verification (RFC 7523)
//! - [`cert`] - Peer certificate model for mutual TLS (RFC 8705)
//! - [`dn`] - RFC 4514 distinguished name parsing
//! - [`store`] - Client store and client key resolution
//! - [`replay`] - `jti` replay prevention for assertions
//! - [`fetch`] - Hardened fetching of sector-identifier and JWKS documents
//! - [`uri`] - URI classification helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oxidc_clients::assertion::{JwtAssertionVerifier, StaticResponseSigningKeys};
//! use oxidc_clients::authn::{
//!     ClientAuthenticatorChain, PublicClientAuthenticator, SecretBasicAuthenticator,
//!     SecretPostAuthenticator,
//! };
//! use oxidc_clients::fetch::HttpMetadataFetcher;
//! use oxidc_clients::registration::RegistrationPipeline;
//! use oxidc_clients::store::InMemoryClientStore;
//!
//! let store = Arc::new(InMemoryClientStore::new());
//!
//! let chain = ClientAuthenticatorChain::new(vec![
//!     Arc::new(SecretBasicAuthenticator::new(store.clone())),
//!     Arc::new(SecretPostAuthenticator::new(store.clone())),
//!     Arc::new(PublicClientAuthenticator::new(store.clone())),
//! ]);
//!
//! let pipeline = RegistrationPipeline::standard(
//!     Arc::new(JwtAssertionVerifier::new()),
//!     Arc::new(StaticResponseSigningKeys::new(["RS256", "ES256"])),
//!     Arc::new(HttpMetadataFetcher::new()),
//!     store,
//!     chain.supported_methods(),
//! );
//! ```
//!
//! The enclosing endpoint layer decodes a DCR JSON body into
//! [`types::ClientRegistrationRequest`], runs the pipeline, and serializes
//! either the accepted registration or the [`error::RegistrationError`];
//! the token endpoint decodes form fields and headers into
//! [`types::ClientRequest`] and runs the chain.
//!
//! ## Standards Compliance
//!
//! - **RFC 6749** - OAuth 2.0 Authorization Framework (client credentials)
//! - **RFC 7591** - OAuth 2.0 Dynamic Client Registration
//! - **RFC 7523** - JWT Profile for Client Authentication
//! - **RFC 8705** - OAuth 2.0 Mutual-TLS Client Authentication
//! - **RFC 8252** - OAuth 2.0 for Native Apps (redirect URI rules)
//! - **RFC 4514** - LDAP String Representation of Distinguished Names

// Submodules
pub mod assertion;
pub mod authn;
pub mod cert;
pub mod dn;
pub mod error;
pub mod fetch;
pub mod registration;
pub mod replay;
pub mod store;
pub mod types;
pub mod uri;

// Re-export the request-path types
#[doc(inline)]
pub use error::{RegistrationError, RegistrationErrorCode};

#[doc(inline)]
pub use types::{
    ApplicationType, AuthMethod, ClientInfo, ClientRegistrationRequest, ClientRequest,
    ClientSecret, ClientType, SubjectType, TlsClientAuthMetadata,
};

// Re-export the two composites
#[doc(inline)]
pub use authn::ClientAuthenticatorChain;

#[doc(inline)]
pub use registration::{RegistrationPipeline, ValidatedRegistration};
