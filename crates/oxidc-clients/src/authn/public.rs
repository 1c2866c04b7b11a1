//! Public client "authentication"
//!
//! Public clients cannot hold a credential; they identify themselves with a
//! bare `client_id`. The only checks are that the client exists, is
//! registered as public, and is configured with the `none` method. A stray
//! `client_secret` in the request is ignored rather than rejected — public
//! clients frequently send empty form fields.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::authn::ClientAuthenticator;
use crate::store::ClientStore;
use crate::types::{AuthMethod, ClientInfo, ClientRequest, ClientType};

/// The `none` method: registered public clients identified by `client_id`.
pub struct PublicClientAuthenticator {
    store: Arc<dyn ClientStore>,
    methods: [AuthMethod; 1],
}

impl PublicClientAuthenticator {
    /// Authenticator resolving clients from `store`.
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self {
            store,
            methods: [AuthMethod::None],
        }
    }
}

#[async_trait]
impl ClientAuthenticator for PublicClientAuthenticator {
    fn supported_methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    async fn authenticate(&self, request: &ClientRequest) -> Option<ClientInfo> {
        let client_id = request.client_id.as_deref()?.trim();
        if client_id.is_empty() {
            return None;
        }

        let client = self.store.find_client(client_id).await?;
        if client.client_type != ClientType::Public || client.auth_method != AuthMethod::None {
            debug!(client_id = %client_id, "Client is not a public none-method client");
            return None;
        }
        Some(client)
    }
}
