//! Typed sync events.
//!
//! Domain managers and the session client broadcast their outcomes on
//! an [`EventBus`] so that UI and gameplay systems can react without
//! holding references to the managers.

use parking_lot::Mutex;
use std::sync::Arc;

/// The four record domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    /// Playable characters.
    Characters,
    /// Item collections (UI and per-scene subsets).
    Inventory,
    /// Active/completed/failed quests.
    Quests,
    /// Stats handlers and attribute values.
    Stats,
}

impl DomainKind {
    /// Returns the domain name used for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Characters => "characters",
            DomainKind::Inventory => "inventory",
            DomainKind::Quests => "quests",
            DomainKind::Stats => "stats",
        }
    }
}

/// An event broadcast by the sync layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A domain finished saving, by either path.
    DataSaved(DomainKind),
    /// A domain finished loading, by either path. Raised even for
    /// empty results so dependent systems can proceed.
    DataLoaded(DomainKind),
    /// A character was created.
    CharacterCreated(String),
    /// Character creation failed (duplicate name, server rejection,
    /// or missing token in remote mode).
    CreateFailed(String),
    /// A character and its dependent local keys were deleted.
    CharacterDeleted(String),
    /// A request was rejected with 401; an external session component
    /// should refresh the access token.
    AuthTokenExpired,
    /// No refresh arrived in time (or the refresh itself failed);
    /// a higher-level UI should prompt for re-login.
    SessionExpired,
    /// The access token was refreshed.
    TokenRefreshed,
    /// Login succeeded for the named account.
    LoggedIn(String),
    /// Login failed.
    LoginFailed,
    /// Account registration succeeded.
    AccountCreated(String),
    /// Account registration failed.
    AccountCreateFailed,
    /// A password recovery mail was sent.
    PasswordRecovered,
    /// Password recovery failed.
    PasswordRecoverFailed,
    /// The password was reset.
    PasswordReset,
    /// Password reset failed.
    PasswordResetFailed,
}

type Subscriber = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// A synchronous broadcast bus for [`SyncEvent`]s.
///
/// Subscribers are invoked on the emitting thread, outside the bus
/// lock, so a subscriber may emit further events.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for all events.
    pub fn subscribe<F>(&self, f: F)
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.subscribers.lock().push(Arc::new(f));
    }

    /// Broadcasts an event to all subscribers.
    pub fn emit(&self, event: &SyncEvent) {
        let subscribers: Vec<Subscriber> = self.subscribers.lock().clone();
        for subscriber in subscribers {
            subscriber(event);
        }
    }
}

/// A subscriber that records every event it sees. Test helper.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes this log to the given bus.
    pub fn attach(&self, bus: &EventBus) {
        let events = Arc::clone(&self.events);
        bus.subscribe(move |event| events.lock().push(event.clone()));
    }

    /// Returns a copy of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// True if the log contains `event`.
    #[must_use]
    pub fn contains(&self, event: &SyncEvent) -> bool {
        self.events.lock().iter().any(|e| e == event)
    }

    /// Number of times `event` was recorded.
    #[must_use]
    pub fn count(&self, event: &SyncEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}
