//! Signed-out session tokens.
//!
//! Tokens are stateless, so signing out records the token id here until the
//! token would have expired anyway. The registry lives in process memory;
//! a restart forgets it.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use shelfwatch_core::types::Timestamp;

#[derive(Default)]
pub struct RevokedSessions {
    /// Token id -> original expiry.
    entries: RwLock<HashMap<String, Timestamp>>,
}

impl RevokedSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token id until `expires_at`. Entries that have already
    /// expired are pruned on the way.
    pub async fn revoke(&self, token_id: &str, expires_at: Timestamp) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, exp| *exp > now);
        entries.insert(token_id.to_string(), expires_at);
    }

    pub async fn is_revoked(&self, token_id: &str) -> bool {
        self.entries.read().await.contains_key(token_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn revoked_ids_are_reported() {
        let registry = RevokedSessions::new();
        assert!(!registry.is_revoked("t1").await);
        registry.revoke("t1", Utc::now() + Duration::minutes(30)).await;
        assert!(registry.is_revoked("t1").await);
        assert!(!registry.is_revoked("t2").await);
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let registry = RevokedSessions::new();
        registry.revoke("old", Utc::now() - Duration::minutes(1)).await;
        registry.revoke("new", Utc::now() + Duration::minutes(30)).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.is_revoked("new").await);
    }
}
