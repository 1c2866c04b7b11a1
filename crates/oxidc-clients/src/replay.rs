//! JWT assertion replay prevention
//!
//! RFC 7523 client assertions may carry a `jti`; once an assertion
//! authenticates a client, its `jti` is marked used until the assertion's own
//! expiry so a captured assertion cannot be presented twice. The registry is a
//! collaborator of the two assertion authenticators; they call
//! [`ReplayRegistry::set_status`] with exactly the `jti`, [`TokenStatus::Used`],
//! and the assertion expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Lifecycle status of a single-use token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TokenStatus {
    /// The token has been presented and must not be accepted again.
    Used,
}

/// Single-use token tracking.
#[async_trait]
pub trait ReplayRegistry: Send + Sync {
    /// Record `status` for `jti`. `expires_at` bounds how long the record
    /// must be retained; `None` means no known expiry.
    async fn set_status(&self, jti: &str, status: TokenStatus, expires_at: Option<DateTime<Utc>>);

    /// Whether `jti` is currently marked used.
    async fn is_used(&self, jti: &str) -> bool;
}

/// Concurrent in-memory [`ReplayRegistry`] with lazy expiry.
///
/// Expired entries are swept opportunistically on writes; for a clustered
/// provider, back this trait with a shared store instead.
#[derive(Debug, Default)]
pub struct InMemoryReplayRegistry {
    entries: DashMap<String, (TokenStatus, Option<DateTime<Utc>>)>,
}

impl InMemoryReplayRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(&self, now: DateTime<Utc>) {
        self.entries
            .retain(|_, (_, expires_at)| expires_at.is_none_or(|expiry| expiry > now));
    }
}

#[async_trait]
impl ReplayRegistry for InMemoryReplayRegistry {
    async fn set_status(&self, jti: &str, status: TokenStatus, expires_at: Option<DateTime<Utc>>) {
        self.sweep(Utc::now());
        self.entries.insert(jti.to_string(), (status, expires_at));
    }

    async fn is_used(&self, jti: &str) -> bool {
        let now = Utc::now();
        self.entries.get(jti).is_some_and(|entry| {
            let (status, expires_at) = *entry;
            status == TokenStatus::Used && expires_at.is_none_or(|expiry| expiry > now)
        })
    }
}
