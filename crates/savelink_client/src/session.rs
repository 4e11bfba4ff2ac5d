//! Account session client.
//!
//! Drives the auth endpoints: login, registration, token refresh, and
//! password recovery/reset. A successful login stores the tokens, the
//! account name, and the server base address, then enables server
//! persistence for the rest of the session.

use crate::auth::{ACCOUNT_KEY, SERVER_BASE_URL_KEY};
use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use crate::events::SyncEvent;
use savelink_protocol::{
    endpoints, AuthErrorBody, Credentials, PasswordRecovery, PasswordReset, RefreshRequest,
    TokenResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Client for the account endpoints.
pub struct SessionClient {
    ctx: Arc<SyncContext>,
}

impl SessionClient {
    /// Creates a session client over the shared context.
    pub fn new(ctx: Arc<SyncContext>) -> Arc<Self> {
        Arc::new(Self { ctx })
    }

    /// Subscribes this client to the event bus so that
    /// [`SyncEvent::AuthTokenExpired`] triggers a token refresh. The
    /// bus invokes subscribers on the emitting thread, so the waiting
    /// auth-retry coordinator observes the refresh before its timeout.
    pub fn attach(self: &Arc<Self>) {
        let session = Arc::clone(self);
        self.ctx.events.subscribe(move |event| {
            if matches!(event, SyncEvent::AuthTokenExpired) {
                // Failure already emits SessionExpired; nothing to do here.
                let _ = session.refresh();
            }
        });
    }

    /// Returns the logged-in account name, if a login was persisted.
    #[must_use]
    pub fn account(&self) -> Option<String> {
        match self.ctx.store.get(ACCOUNT_KEY) {
            Ok(name) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Logs in and switches the session to server persistence.
    ///
    /// Stores the returned tokens, the account name, and the server
    /// base address so a later process start resumes in server mode.
    /// Emits [`SyncEvent::LoggedIn`] or [`SyncEvent::LoginFailed`].
    ///
    /// # Errors
    ///
    /// Transport failure, server rejection, a malformed token
    /// response, or a store failure while persisting the session.
    pub fn login(&self, username: &str, password: &str) -> SyncResult<()> {
        match self.authenticate(endpoints::LOGIN, username, password) {
            Ok(()) => {
                info!(username, "logged in");
                self.ctx
                    .events
                    .emit(&SyncEvent::LoggedIn(username.to_string()));
                Ok(())
            }
            Err(e) => {
                self.ctx.events.emit(&SyncEvent::LoginFailed);
                Err(e)
            }
        }
    }

    /// Registers a new account. The server logs the account in as part
    /// of registration, so this stores tokens exactly like
    /// [`SessionClient::login`]. Emits [`SyncEvent::AccountCreated`]
    /// or [`SyncEvent::AccountCreateFailed`].
    ///
    /// # Errors
    ///
    /// Same as [`SessionClient::login`].
    pub fn register(&self, username: &str, password: &str) -> SyncResult<()> {
        match self.authenticate(endpoints::REGISTER, username, password) {
            Ok(()) => {
                info!(username, "account registered");
                self.ctx
                    .events
                    .emit(&SyncEvent::AccountCreated(username.to_string()));
                Ok(())
            }
            Err(e) => {
                self.ctx.events.emit(&SyncEvent::AccountCreateFailed);
                Err(e)
            }
        }
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// On success the refresh gate is released, waking every call
    /// blocked in the auth-retry coordinator, and
    /// [`SyncEvent::TokenRefreshed`] is emitted. On failure
    /// [`SyncEvent::SessionExpired`] is emitted; the context switches
    /// the session to local persistence in response.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingToken`] when no refresh token is stored,
    /// otherwise the transport or server failure.
    pub fn refresh(&self) -> SyncResult<()> {
        let outcome = self.try_refresh();
        if let Err(ref e) = outcome {
            warn!(error = %e, "token refresh failed");
            self.ctx.events.emit(&SyncEvent::SessionExpired);
        }
        outcome
    }

    /// Requests a password recovery code for an account. Emits
    /// [`SyncEvent::PasswordRecovered`] or
    /// [`SyncEvent::PasswordRecoverFailed`].
    ///
    /// # Errors
    ///
    /// Transport failure or server rejection.
    pub fn recover_password(&self, username: &str) -> SyncResult<()> {
        let body = serde_json::to_string(&PasswordRecovery {
            username: username.to_string(),
        })?;
        match self
            .ctx
            .remote
            .post_unauthenticated(endpoints::RECOVER_PASSWORD, body)
        {
            Ok(_) => {
                self.ctx.events.emit(&SyncEvent::PasswordRecovered);
                Ok(())
            }
            Err(e) => {
                warn!(username, error = %Self::rejection_reason(&e), "password recovery failed");
                self.ctx.events.emit(&SyncEvent::PasswordRecoverFailed);
                Err(e)
            }
        }
    }

    /// Resets the password with a recovery code. Emits
    /// [`SyncEvent::PasswordReset`] or
    /// [`SyncEvent::PasswordResetFailed`].
    ///
    /// # Errors
    ///
    /// Transport failure or server rejection.
    pub fn reset_password(&self, code: &str, password: &str) -> SyncResult<()> {
        let body = serde_json::to_string(&PasswordReset {
            code: code.to_string(),
            password: password.to_string(),
        })?;
        match self
            .ctx
            .remote
            .post_unauthenticated(endpoints::RESET_PASSWORD, body)
        {
            Ok(_) => {
                self.ctx.events.emit(&SyncEvent::PasswordReset);
                Ok(())
            }
            Err(e) => {
                warn!(error = %Self::rejection_reason(&e), "password reset failed");
                self.ctx.events.emit(&SyncEvent::PasswordResetFailed);
                Err(e)
            }
        }
    }

    /// Clears the stored tokens. Saves and loads fall back to local
    /// persistence from the next call on.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn logout(&self) -> SyncResult<()> {
        self.ctx.tokens.clear()?;
        self.ctx.store.delete(ACCOUNT_KEY)?;
        info!("logged out");
        Ok(())
    }

    fn authenticate(&self, endpoint: &str, username: &str, password: &str) -> SyncResult<()> {
        let body = serde_json::to_string(&Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        let response = match self.ctx.remote.post_unauthenticated(endpoint, body) {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint, username, error = %Self::rejection_reason(&e), "authentication failed");
                return Err(e);
            }
        };

        let tokens: TokenResponse = serde_json::from_str(&response)?;
        self.ctx
            .tokens
            .set_tokens(&tokens.token, tokens.refresh.as_deref())?;
        self.ctx.store.set(ACCOUNT_KEY, username)?;
        self.ctx
            .store
            .set(SERVER_BASE_URL_KEY, self.ctx.remote.base_url())?;
        self.ctx.enable_server_mode();
        Ok(())
    }

    fn try_refresh(&self) -> SyncResult<()> {
        let refresh = self
            .ctx
            .tokens
            .refresh_token()
            .ok_or(SyncError::MissingToken)?;

        let body = serde_json::to_string(&RefreshRequest { refresh })?;
        let response = self
            .ctx
            .remote
            .post_unauthenticated(endpoints::REFRESH, body)?;

        let tokens: TokenResponse = serde_json::from_str(&response)?;
        self.ctx
            .tokens
            .set_tokens(&tokens.token, tokens.refresh.as_deref())?;
        self.ctx.tokens.mark_refreshed();
        info!("access token refreshed");
        self.ctx.events.emit(&SyncEvent::TokenRefreshed);
        Ok(())
    }

    /// Pulls the server's reason out of a rejection body when one is
    /// present, for logs.
    fn rejection_reason(error: &SyncError) -> String {
        if let SyncError::ServerRejected { message, .. } = error {
            if let Ok(body) = serde_json::from_str::<AuthErrorBody>(message) {
                return body.error;
            }
        }
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::events::EventLog;
    use crate::http::{HttpResponse, MockHttpClient};
    use savelink_store::{KvStore, MemoryStore};

    fn setup() -> (Arc<SessionClient>, Arc<SyncContext>, Arc<MockHttpClient>, EventLog) {
        let store = Arc::new(MemoryStore::new());
        let http = Arc::new(MockHttpClient::new());
        let ctx = SyncContext::new(&ClientConfig::default(), http.clone(), store);
        let log = EventLog::new();
        log.attach(&ctx.events);
        (SessionClient::new(Arc::clone(&ctx)), ctx, http, log)
    }

    #[test]
    fn login_stores_session_and_enables_server_mode() {
        let (session, ctx, http, log) = setup();
        http.enqueue(HttpResponse::ok(
            r#"{"token":"acc1","refresh":"ref1","expires_in":900}"#,
        ));

        session.login("dora", "hunter2").unwrap();

        assert_eq!(ctx.tokens.access_token().as_deref(), Some("acc1"));
        assert_eq!(ctx.tokens.refresh_token().as_deref(), Some("ref1"));
        assert_eq!(session.account().as_deref(), Some("dora"));
        assert_eq!(
            ctx.store.get(SERVER_BASE_URL_KEY).unwrap(),
            ctx.remote.base_url()
        );
        assert!(ctx.use_remote());
        assert!(log.contains(&SyncEvent::LoggedIn("dora".into())));
    }

    #[test]
    fn login_rejection_emits_login_failed() {
        let (session, ctx, http, log) = setup();
        http.enqueue(HttpResponse::with_status(
            403,
            r#"{"error":"bad credentials"}"#,
        ));

        let result = session.login("dora", "wrong");
        assert!(matches!(
            result,
            Err(SyncError::ServerRejected { status: 403, .. })
        ));
        assert!(!ctx.tokens.has_token());
        assert!(log.contains(&SyncEvent::LoginFailed));
    }

    #[test]
    fn register_logs_the_account_in() {
        let (session, ctx, http, log) = setup();
        http.enqueue(HttpResponse::ok(r#"{"token":"acc1"}"#));

        session.register("dora", "hunter2").unwrap();

        assert!(ctx.use_remote());
        assert!(log.contains(&SyncEvent::AccountCreated("dora".into())));
        assert!(http.requests()[0].url.ends_with("/register"));
    }

    #[test]
    fn refresh_without_refresh_token_expires_session() {
        let (session, _, _, log) = setup();
        let result = session.refresh();
        assert!(matches!(result, Err(SyncError::MissingToken)));
        assert!(log.contains(&SyncEvent::SessionExpired));
    }

    #[test]
    fn refresh_rotates_tokens_and_releases_waiters() {
        let (session, ctx, http, log) = setup();
        ctx.tokens.set_tokens("old", Some("ref1")).unwrap();
        http.enqueue(HttpResponse::ok(r#"{"token":"new","refresh":"ref2"}"#));

        let observed = ctx.tokens.refresh_generation();
        session.refresh().unwrap();

        assert_eq!(ctx.tokens.access_token().as_deref(), Some("new"));
        assert_eq!(ctx.tokens.refresh_token().as_deref(), Some("ref2"));
        assert!(ctx
            .tokens
            .wait_refreshed(observed, std::time::Duration::from_millis(1)));
        assert!(log.contains(&SyncEvent::TokenRefreshed));
    }

    #[test]
    fn attached_session_services_auth_expiry() {
        let (session, ctx, http, log) = setup();
        ctx.tokens.set_tokens("stale", Some("ref1")).unwrap();
        session.attach();
        http.enqueue(HttpResponse::ok(r#"{"token":"fresh"}"#));

        let observed = ctx.tokens.refresh_generation();
        ctx.events.emit(&SyncEvent::AuthTokenExpired);

        assert_eq!(ctx.tokens.access_token().as_deref(), Some("fresh"));
        assert!(ctx
            .tokens
            .wait_refreshed(observed, std::time::Duration::from_millis(1)));
        assert!(log.contains(&SyncEvent::TokenRefreshed));
    }

    #[test]
    fn password_recovery_and_reset_emit_outcomes() {
        let (session, _, http, log) = setup();
        http.enqueue(HttpResponse::ok(""));
        http.enqueue(HttpResponse::with_status(400, r#"{"error":"bad code"}"#));

        session.recover_password("dora").unwrap();
        assert!(log.contains(&SyncEvent::PasswordRecovered));
        assert!(http.requests()[0].url.ends_with("/recover-password"));

        assert!(session.reset_password("000000", "newpass").is_err());
        assert!(log.contains(&SyncEvent::PasswordResetFailed));
    }

    #[test]
    fn logout_clears_tokens_and_account() {
        let (session, ctx, http, _) = setup();
        http.enqueue(HttpResponse::ok(r#"{"token":"acc1","refresh":"ref1"}"#));
        session.login("dora", "hunter2").unwrap();

        session.logout().unwrap();
        assert!(!ctx.tokens.has_token());
        assert!(session.account().is_none());
        assert!(!ctx.use_remote());
    }
}
