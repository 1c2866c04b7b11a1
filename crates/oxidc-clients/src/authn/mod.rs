//! Token endpoint client authentication
//!
//! Every supported authentication method is one [`ClientAuthenticator`]; the
//! [`ClientAuthenticatorChain`] tries them in registration order and the
//! first authenticator that produces a verified [`ClientInfo`] wins. An
//! authenticator declines — for a credential shape that is not its own, a
//! client it cannot find, or a credential that fails verification — by
//! returning `None`, with no distinction between those cases: failure detail
//! would tell an attacker which part of a guessed credential was right.
//! The detail goes to debug-level logs instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oxidc_clients::authn::{ClientAuthenticatorChain, SecretBasicAuthenticator};
//! use oxidc_clients::store::InMemoryClientStore;
//! use oxidc_clients::types::ClientRequest;
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryClientStore::new());
//! let chain = ClientAuthenticatorChain::new(vec![
//!     Arc::new(SecretBasicAuthenticator::new(store)),
//! ]);
//!
//! let request = ClientRequest::new("https://op.example.com/token")
//!     .with_authorization("Basic Y2lkOmNzZWNyZXQ=");
//!
//! match chain.authenticate(&request).await {
//!     Some(client) => println!("authenticated {}", client.client_id),
//!     None => println!("authentication failed"),
//! }
//! # }
//! ```

mod assertion;
mod mtls;
mod public;
mod secret;

pub use assertion::{PrivateKeyJwtAuthenticator, SecretJwtAuthenticator};
pub use mtls::{
    CertificateBinding, DnSanBinding, SelfSignedTlsClientAuthenticator, TlsClientAuthenticator,
};
pub use public::PublicClientAuthenticator;
pub use secret::{SecretBasicAuthenticator, SecretPostAuthenticator};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::types::{AuthMethod, ClientInfo, ClientRequest};

/// One client authentication method.
#[async_trait]
pub trait ClientAuthenticator: Send + Sync {
    /// The auth-method identifiers this authenticator implements.
    fn supported_methods(&self) -> &[AuthMethod];

    /// Try to authenticate `request`.
    ///
    /// `Some` carries the verified client; `None` means "not my credential
    /// type or verification failed" — expected failures never surface as
    /// errors.
    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo>;
}

/// Ordered authenticator composite with first-match-wins semantics.
pub struct ClientAuthenticatorChain {
    authenticators: Vec<Arc<dyn ClientAuthenticator>>,
}

impl ClientAuthenticatorChain {
    /// Build a chain trying `authenticators` in the given order.
    pub fn new(authenticators: Vec<Arc<dyn ClientAuthenticator>>) -> Self {
        Self { authenticators }
    }

    /// Try each member in order; the first verified client wins.
    pub async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        for authenticator in &self.authenticators {
            if let Some(client) = authenticator.authenticate(request).await {
                debug!(client_id = %client.client_id, "Client authenticated");
                return Some(client);
            }
        }
        debug!("No authenticator produced a client");
        None
    }

    /// The concatenation of every member's supported methods, duplicates and
    /// all. The registration pipeline checks requested auth methods against
    /// this set.
    pub fn supported_methods(&self) -> Vec<AuthMethod> {
        self.authenticators
            .iter()
            .flat_map(|authenticator| authenticator.supported_methods().iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAuthenticator {
        methods: Vec<AuthMethod>,
        result: Option<ClientInfo>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ClientAuthenticator for ScriptedAuthenticator {
        fn supported_methods(&self) -> &[AuthMethod] {
            &self.methods
        }

        async fn authenticate(&self, _request: &ClientRequest) -> Option<ClientInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn scripted(
        methods: Vec<AuthMethod>,
        result: Option<ClientInfo>,
    ) -> (Arc<dyn ClientAuthenticator>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let authenticator = Arc::new(ScriptedAuthenticator {
            methods,
            result,
            calls: calls.clone(),
        });
        (authenticator, calls)
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let (a, a_calls) = scripted(vec![AuthMethod::ClientSecretBasic], None);
        let (b, b_calls) = scripted(
            vec![AuthMethod::ClientSecretPost],
            Some(ClientInfo::confidential("cid", AuthMethod::ClientSecretPost)),
        );
        let (c, c_calls) = scripted(vec![AuthMethod::None], None);

        let chain = ClientAuthenticatorChain::new(vec![a, b, c]);
        let client = chain
            .authenticate(&ClientRequest::new("https://op.example.com/token"))
            .await
            .unwrap();

        assert_eq!(client.client_id, "cid");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_declining_yields_none() {
        let (a, _) = scripted(vec![AuthMethod::ClientSecretBasic], None);
        let (b, _) = scripted(vec![AuthMethod::None], None);

        let chain = ClientAuthenticatorChain::new(vec![a, b]);
        assert!(
            chain
                .authenticate(&ClientRequest::new("https://op.example.com/token"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn supported_methods_concatenate_with_duplicates() {
        let (a, _) = scripted(
            vec![AuthMethod::ClientSecretBasic, AuthMethod::ClientSecretPost],
            None,
        );
        let (b, _) = scripted(vec![AuthMethod::ClientSecretBasic], None);

        let chain = ClientAuthenticatorChain::new(vec![a, b]);
        assert_eq!(
            chain.supported_methods(),
            vec![
                AuthMethod::ClientSecretBasic,
                AuthMethod::ClientSecretPost,
                AuthMethod::ClientSecretBasic,
            ]
        );
    }
}
