//! Auth-retry coordination.
//!
//! Implements the 401 → refresh → retry-once protocol shared by all
//! domain managers. The coordinator has two states per call, direct
//! and awaiting-refresh; it never loops, so a server that also
//! rejects the refreshed token costs exactly one extra attempt.

use crate::auth::TokenStore;
use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, SyncEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Wraps remote calls with the 401 retry protocol.
#[derive(Clone)]
pub struct AuthRetryCoordinator {
    tokens: Arc<TokenStore>,
    events: EventBus,
    refresh_timeout: Duration,
}

impl AuthRetryCoordinator {
    /// Creates a coordinator.
    pub fn new(tokens: Arc<TokenStore>, events: EventBus, refresh_timeout: Duration) -> Self {
        Self {
            tokens,
            events,
            refresh_timeout,
        }
    }

    /// Runs `call`, retrying exactly once if the first attempt fails
    /// with [`SyncError::AuthExpired`] and an external refresh
    /// completes within the configured timeout.
    ///
    /// On 401 the coordinator emits [`SyncEvent::AuthTokenExpired`]
    /// and waits. If the refresh arrives, the retry's result is
    /// returned verbatim - a second 401 is surfaced, never retried
    /// again. If the timeout elapses, [`SyncEvent::SessionExpired`]
    /// is emitted and the original 401 is surfaced.
    ///
    /// # Errors
    ///
    /// Whatever `call` returns, subject to the single-retry rule.
    pub fn execute<T>(&self, call: impl Fn() -> SyncResult<T>) -> SyncResult<T> {
        // Snapshot before the first attempt: a refresh triggered by a
        // concurrent 401 in another domain counts for this call too.
        let observed = self.tokens.refresh_generation();

        match call() {
            Err(SyncError::AuthExpired) => {
                debug!(
                    timeout_ms = self.refresh_timeout.as_millis() as u64,
                    "access token rejected, awaiting refresh"
                );
                self.events.emit(&SyncEvent::AuthTokenExpired);

                if self.tokens.wait_refreshed(observed, self.refresh_timeout) {
                    debug!("token refreshed, retrying request once");
                    call()
                } else {
                    warn!("no token refresh within timeout, session expired");
                    self.events.emit(&SyncEvent::SessionExpired);
                    Err(SyncError::AuthExpired)
                }
            }
            other => other,
        }
    }
}
