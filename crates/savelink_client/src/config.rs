//! Configuration for the sync client.

use std::time::Duration;

/// Configuration for a sync client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base address, e.g. `https://play.example.com`.
    ///
    /// A base address persisted by a previous login (under the
    /// `ServerBaseUrl` store key) takes precedence over this value.
    pub base_url: String,
    /// How long the auth-retry coordinator waits for an external
    /// token refresh after a 401 before declaring the session
    /// expired.
    pub refresh_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the given server address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the refresh wait timeout.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}
