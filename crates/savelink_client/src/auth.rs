//! Token storage and refresh coordination.

use crate::error::SyncResult;
use parking_lot::{Condvar, Mutex};
use savelink_store::KvStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Store key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
/// Store key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";
/// Store key for the logged-in account name.
pub const ACCOUNT_KEY: &str = "auth.account";
/// Store key for the server base address persisted at login.
pub const SERVER_BASE_URL_KEY: &str = "ServerBaseUrl";

/// Process-wide token state.
///
/// Tokens are persisted through the local store on every write, so a
/// session survives a process restart. The refresh gate replaces the
/// flag-in-storage pattern: waiters block on a generation counter and
/// a refresh wakes all of them at once, so concurrent 401 handlers in
/// different domains all observe the same refresh.
pub struct TokenStore {
    store: Arc<dyn KvStore>,
    gate: RefreshGate,
}

impl TokenStore {
    /// Creates a token store backed by the given local store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            gate: RefreshGate::default(),
        }
    }

    /// Returns the access token, if one is stored.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read_key(ACCESS_TOKEN_KEY)
    }

    /// Returns the refresh token, if one is stored.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read_key(REFRESH_TOKEN_KEY)
    }

    /// True if an access token is stored.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.access_token().is_some()
    }

    /// Stores new tokens. Persists immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> SyncResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// Clears both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> SyncResult<()> {
        self.store.delete(ACCESS_TOKEN_KEY)?;
        self.store.delete(REFRESH_TOKEN_KEY)?;
        Ok(())
    }

    /// Returns the current refresh generation.
    ///
    /// Snapshot this *before* issuing a request so that a refresh
    /// completing at any point afterwards is observed by
    /// [`TokenStore::wait_refreshed`].
    #[must_use]
    pub fn refresh_generation(&self) -> u64 {
        self.gate.generation()
    }

    /// Signals that a token refresh completed. Wakes all waiters.
    pub fn mark_refreshed(&self) {
        self.gate.notify();
    }

    /// Blocks until a refresh newer than `observed` completes, or
    /// `timeout` elapses. Returns true if a refresh was observed.
    #[must_use]
    pub fn wait_refreshed(&self, observed: u64, timeout: Duration) -> bool {
        self.gate.wait(observed, timeout)
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read token from store");
                None
            }
        }
    }
}

/// Generation-counting refresh gate.
///
/// `notify` bumps the generation and wakes every waiter; a waiter is
/// satisfied by any generation newer than the one it observed. This
/// makes refresh completion a broadcast, never a consumable flag.
#[derive(Default)]
struct RefreshGate {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl RefreshGate {
    fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.condvar.notify_all();
    }

    fn wait(&self, observed: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut generation = self.generation.lock();
        while *generation == observed {
            if self.condvar.wait_until(&mut generation, deadline).timed_out() {
                return *generation != observed;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savelink_store::MemoryStore;
    use std::thread;

    fn token_store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn tokens_roundtrip() {
        let tokens = token_store();
        assert!(!tokens.has_token());

        tokens.set_tokens("access", Some("refresh")).unwrap();
        assert_eq!(tokens.access_token().as_deref(), Some("access"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh"));

        tokens.clear().unwrap();
        assert!(!tokens.has_token());
        assert!(tokens.refresh_token().is_none());
    }

    #[test]
    fn set_tokens_keeps_refresh_when_not_rotated() {
        let tokens = token_store();
        tokens.set_tokens("a1", Some("r1")).unwrap();
        tokens.set_tokens("a2", None).unwrap();
        assert_eq!(tokens.access_token().as_deref(), Some("a2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn tokens_persist_through_shared_store() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let tokens = TokenStore::new(store.clone());
        tokens.set_tokens("abc", None).unwrap();

        let reopened = TokenStore::new(store);
        assert_eq!(reopened.access_token().as_deref(), Some("abc"));
    }

    #[test]
    fn wait_refreshed_times_out_without_refresh() {
        let tokens = token_store();
        let observed = tokens.refresh_generation();
        assert!(!tokens.wait_refreshed(observed, Duration::from_millis(20)));
    }

    #[test]
    fn refresh_before_wait_is_still_observed() {
        let tokens = token_store();
        let observed = tokens.refresh_generation();
        tokens.mark_refreshed();
        // The refresh completed before the wait started; the stale
        // generation snapshot still satisfies the waiter.
        assert!(tokens.wait_refreshed(observed, Duration::from_millis(20)));
    }

    #[test]
    fn refresh_wakes_multiple_waiters() {
        let tokens = Arc::new(token_store());
        let observed = tokens.refresh_generation();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let tokens = Arc::clone(&tokens);
                thread::spawn(move || tokens.wait_refreshed(observed, Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        tokens.mark_refreshed();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }
}
