//! Optional token revocation set.
//!
//! A stateless token cannot be destroyed before expiry, so logout-before-
//! expiry needs a small deny-list keyed by token id. Entries carry the
//! token's natural expiry and are pruned once past it, which bounds the set
//! to tokens issued within one TTL.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use gatewarden_core::TokenId;

/// In-memory deny-list of revoked token ids.
#[derive(Debug, Default)]
pub struct RevocationSet {
    inner: Mutex<HashMap<TokenId, DateTime<Utc>>>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token until its natural expiry.
    ///
    /// Already-expired tokens are not recorded; lazy expiry rejects them
    /// anyway.
    pub fn revoke(&self, token_id: TokenId, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("revocation set poisoned");
        inner.retain(|_, exp| now < *exp);
        if now < expires_at {
            tracing::debug!(%token_id, %expires_at, "revoking token");
            inner.insert(token_id, expires_at);
        }
    }

    /// Whether `token_id` is currently revoked. Expired entries are dropped
    /// on lookup.
    pub fn is_revoked(&self, token_id: &TokenId, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock().expect("revocation set poisoned");
        match inner.get(token_id) {
            Some(expires_at) if now < *expires_at => true,
            Some(_) => {
                inner.remove(token_id);
                false
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("revocation set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn revoked_until_natural_expiry() {
        let set = RevocationSet::new();
        let id = TokenId::new();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(60);

        set.revoke(id, expires_at, now);
        assert!(set.is_revoked(&id, now));
        assert!(set.is_revoked(&id, now + Duration::seconds(59)));

        // Past expiry the entry is moot and gets dropped.
        assert!(!set.is_revoked(&id, now + Duration::seconds(60)));
        assert!(set.is_empty());
    }

    #[test]
    fn size_is_bounded_by_pruning() {
        let set = RevocationSet::new();
        let now = Utc::now();

        for i in 0..10 {
            set.revoke(TokenId::new(), now + Duration::seconds(i + 1), now);
        }
        assert_eq!(set.len(), 10);

        // Revoking after every earlier entry expired prunes them all.
        let later = now + Duration::seconds(100);
        set.revoke(TokenId::new(), later + Duration::seconds(60), later);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn already_expired_token_is_not_recorded() {
        let set = RevocationSet::new();
        let now = Utc::now();

        set.revoke(TokenId::new(), now - Duration::seconds(1), now);
        assert!(set.is_empty());
    }
}
