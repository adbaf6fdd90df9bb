//! One-time authorization code store
//!
//! Hands a session token to a client without exposing it in a redirect URL:
//! the server stores the token under an opaque code, the client exchanges the
//! code exactly once. Exchange is destructive (remove-and-return), so a code
//! cannot be replayed even if intercepted after use.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Code lifetime
const CODE_TTL: Duration = Duration::from_secs(60);

/// Sweep interval for expired-but-unconsumed entries
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CodeEntry {
    token: String,
    expires_at: Instant,
}

/// Concurrent one-time code map with background eviction
#[derive(Debug)]
pub struct AuthCodeStore {
    store: DashMap<String, CodeEntry>,
    ttl: Duration,
}

impl AuthCodeStore {
    pub fn new() -> Self {
        Self::with_ttl(CODE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Store a token under a fresh opaque code and return the code
    pub fn issue(&self, token: String) -> String {
        let code = Uuid::new_v4().to_string();
        self.store.insert(
            code.clone(),
            CodeEntry {
                token,
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Atomically consume a code. Missing, already-consumed and expired codes
    /// are indistinguishable to the caller.
    pub fn exchange(&self, code: &str) -> Option<String> {
        let (_, entry) = self.store.remove(code)?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.token)
    }

    /// Drop expired-but-unconsumed entries
    pub fn sweep(&self) {
        let now = Instant::now();
        self.store.retain(|_, entry| now <= entry.expires_at);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Spawn the periodic sweep task. Runs independently of exchange calls
    /// and only touches entries already past expiry.
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
                    tracing::debug!(removed, "Swept expired auth codes");
                }
            }
        })
    }
}

impl Default for AuthCodeStore {
    fn default() -> Self {
        Self::new()
    }
}
