//! Credential revocation store
//!
//! Records "invalidate every token issued before T" per user, so password
//! changes and account deletion take effect immediately without a per-token
//! revocation list. Cutoffs older than the maximum token lifetime can no
//! longer affect any live token and are swept.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Longest-lived token we can ever issue; older cutoffs are garbage
const MAX_TOKEN_LIFETIME_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Sweep interval for stale cutoffs
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Concurrent user-id → revoked-before map (epoch millis)
#[derive(Debug, Default)]
pub struct RevocationStore {
    cutoffs: DashMap<i64, i64>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self {
            cutoffs: DashMap::new(),
        }
    }

    /// Record "now" as the cutoff for a user, overwriting any prior cutoff.
    /// Only the most recent revocation matters.
    pub fn revoke_all(&self, user_id: i64) {
        self.cutoffs.insert(user_id, now_millis());
    }

    /// True iff a cutoff exists and the token was issued strictly before it
    pub fn is_revoked(&self, user_id: i64, issued_at_millis: i64) -> bool {
        match self.cutoffs.get(&user_id) {
            Some(cutoff) => issued_at_millis < *cutoff,
            None => false,
        }
    }

    /// Drop cutoffs that predate every possibly-live token
    pub fn sweep(&self) {
        let horizon = now_millis() - MAX_TOKEN_LIFETIME_MS;
        self.cutoffs.retain(|_, cutoff| *cutoff >= horizon);
    }

    pub fn len(&self) -> usize {
        self.cutoffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    /// Spawn the periodic sweep task
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let before = store.len();
                store.sweep();
                let removed = before.saturating_sub(store.len());
                if removed > 0 {
                    tracing::debug!(removed, "Swept stale revocation cutoffs");
                }
            }
        })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_issued_before_cutoff_is_revoked() {
        let store = RevocationStore::new();
        let issued_at = now_millis() - 1000;

        store.revoke_all(1);
        assert!(store.is_revoked(1, issued_at));
    }

    #[test]
    fn token_issued_after_cutoff_is_accepted() {
        let store = RevocationStore::new();
        store.revoke_all(1);

        let issued_at = now_millis() + 1000;
        assert!(!store.is_revoked(1, issued_at));
    }

    #[test]
    fn unknown_user_is_not_revoked() {
        let store = RevocationStore::new();
        assert!(!store.is_revoked(99, now_millis()));
    }

    #[test]
    fn later_revocation_overwrites() {
        let store = RevocationStore::new();
        store.revoke_all(1);
        store.revoke_all(1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_drops_only_stale_cutoffs() {
        let store = RevocationStore::new();
        store.cutoffs.insert(1, now_millis() - MAX_TOKEN_LIFETIME_MS - 1);
        store.revoke_all(2);

        store.sweep();
        assert!(!store.cutoffs.contains_key(&1));
        assert!(store.cutoffs.contains_key(&2));
    }
}
