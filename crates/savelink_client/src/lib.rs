//! # Savelink Client
//!
//! Dual-path persistence client for game save data.
//!
//! This crate provides:
//! - A dual-path save/load engine per record domain
//! - Character roster management with create/delete
//! - Inventory, quest, and stats domain managers
//! - The 401 → refresh → retry-once auth protocol
//! - An account session client (login, register, refresh, recovery)
//! - A typed event bus for sync outcomes
//! - HTTP transport abstraction
//!
//! ## Architecture
//!
//! Every save and load follows the **dual-path** model:
//! 1. With an access token, persist through the remote REST server
//! 2. On any server failure, degrade to the local key-value store
//! 3. Without a token, use the local store directly
//!
//! The remote path wraps each request in the auth-retry coordinator:
//! a 401 broadcasts [`SyncEvent::AuthTokenExpired`], waits a bounded
//! time for a token refresh, and retries exactly once.
//!
//! ## Key Invariants
//!
//! - A save or load never fails outright for server-side reasons;
//!   the local path is the floor
//! - A 401 costs at most one extra attempt per call
//! - A 404 on load is "no data yet", not an error
//! - [`SyncEvent::DataLoaded`] fires even for empty results
//! - A refresh timeout expires the session: [`SyncEvent::SessionExpired`]
//!   switches persistence to local for the rest of the session
//!
//! ## Transport
//!
//! The [`HttpClient`] trait abstracts the HTTP layer, allowing
//! different implementations (reqwest, hyper, ureq) or in-process
//! mocks for testing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod characters;
mod config;
mod context;
mod domain;
mod error;
mod events;
mod http;
mod inventory;
mod quests;
mod remote;
mod retry;
mod session;
mod stats;

pub use auth::{TokenStore, ACCESS_TOKEN_KEY, ACCOUNT_KEY, REFRESH_TOKEN_KEY, SERVER_BASE_URL_KEY};
pub use characters::CharacterSync;
pub use config::ClientConfig;
pub use context::SyncContext;
pub use domain::{DomainSync, RecordDomain};
pub use error::{SyncError, SyncResult};
pub use events::{DomainKind, EventBus, EventLog, SyncEvent};
pub use http::{HttpClient, HttpRequest, HttpResponse, Method, MockHttpClient};
pub use inventory::InventoryDomain;
pub use quests::QuestDomain;
pub use remote::RemoteClient;
pub use retry::AuthRetryCoordinator;
pub use session::SessionClient;
pub use stats::StatsDomain;
