//! Shared wiring for the domain managers.

use crate::auth::{TokenStore, SERVER_BASE_URL_KEY};
use crate::config::ClientConfig;
use crate::events::{EventBus, SyncEvent};
use crate::http::HttpClient;
use crate::remote::RemoteClient;
use crate::retry::AuthRetryCoordinator;
use savelink_store::KvStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared state for one sync session: the local store, the remote
/// client, token state, the retry coordinator, and the event bus.
///
/// Construct one `SyncContext` per process and hand an `Arc` of it to
/// each domain manager; there are no hidden global singletons.
pub struct SyncContext {
    /// Local key-value store (fallback path).
    pub store: Arc<dyn KvStore>,
    /// Remote client (server path).
    pub remote: RemoteClient,
    /// Process-wide token state.
    pub tokens: Arc<TokenStore>,
    /// 401 retry protocol.
    pub coordinator: AuthRetryCoordinator,
    /// Event broadcast bus.
    pub events: EventBus,
    server_mode: Arc<AtomicBool>,
}

impl SyncContext {
    /// Wires up a sync context.
    ///
    /// A server base address persisted by a previous login takes
    /// precedence over `config.base_url`. Remote mode starts enabled
    /// when an access token is already stored, and is switched off
    /// for the rest of the session when [`SyncEvent::SessionExpired`]
    /// is broadcast.
    pub fn new(
        config: &ClientConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KvStore>,
    ) -> Arc<Self> {
        let tokens = Arc::new(TokenStore::new(Arc::clone(&store)));
        let events = EventBus::new();

        let base_url = match store.get(SERVER_BASE_URL_KEY) {
            Ok(saved) if !saved.is_empty() => saved,
            _ => config.base_url.clone(),
        };

        let remote = RemoteClient::new(base_url, http, Arc::clone(&tokens));
        let coordinator = AuthRetryCoordinator::new(
            Arc::clone(&tokens),
            events.clone(),
            config.refresh_timeout,
        );

        let server_mode = Arc::new(AtomicBool::new(tokens.has_token()));
        info!(
            server_mode = server_mode.load(Ordering::SeqCst),
            base_url = remote.base_url(),
            "sync context initialized"
        );

        let mode_flag = Arc::clone(&server_mode);
        events.subscribe(move |event| {
            if matches!(event, SyncEvent::SessionExpired) {
                mode_flag.store(false, Ordering::SeqCst);
            }
        });

        Arc::new(Self {
            store,
            remote,
            tokens,
            coordinator,
            events,
            server_mode,
        })
    }

    /// True while server persistence is selected for this session.
    #[must_use]
    pub fn server_mode(&self) -> bool {
        self.server_mode.load(Ordering::SeqCst)
    }

    /// Enables server persistence. Called by the session client after
    /// a successful login or registration.
    pub fn enable_server_mode(&self) {
        self.server_mode.store(true, Ordering::SeqCst);
    }

    /// True if the remote path should be used for a save or load:
    /// server mode is on and an access token is present.
    #[must_use]
    pub fn use_remote(&self) -> bool {
        self.server_mode() && self.tokens.has_token()
    }
}
