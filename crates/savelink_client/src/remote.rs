//! Remote sync client.
//!
//! Builds full URLs from the configured base address, attaches bearer
//! auth, and maps HTTP statuses onto the sync error taxonomy. Never
//! panics for ordinary HTTP failures: 401, 404, and other 4xx/5xx all
//! come back as distinguishable [`SyncError`] variants.

use crate::auth::TokenStore;
use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpRequest, HttpResponse, Method};
use std::sync::Arc;
use tracing::warn;

/// HTTP client bound to a server base address and a token store.
#[derive(Clone)]
pub struct RemoteClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    tokens: Arc<TokenStore>,
}

impl RemoteClient {
    /// Creates a remote client. Trailing slashes on the base address
    /// are dropped so paths join cleanly.
    pub fn new(
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            tokens,
        }
    }

    /// Returns the base address.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues an authenticated GET.
    ///
    /// # Errors
    ///
    /// See [`RemoteClient::request`].
    pub fn get(&self, path: &str) -> SyncResult<String> {
        self.request(Method::Get, path, None, true)
    }

    /// Issues an authenticated POST with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`RemoteClient::request`].
    pub fn post(&self, path: &str, body: String) -> SyncResult<String> {
        self.request(Method::Post, path, Some(body), true)
    }

    /// Issues an authenticated DELETE.
    ///
    /// # Errors
    ///
    /// See [`RemoteClient::request`].
    pub fn delete(&self, path: &str) -> SyncResult<String> {
        self.request(Method::Delete, path, None, true)
    }

    /// Issues a POST without bearer auth. Used by the auth endpoints
    /// (login, register, refresh) which run before a token exists.
    ///
    /// # Errors
    ///
    /// See [`RemoteClient::request`].
    pub fn post_unauthenticated(&self, path: &str, body: String) -> SyncResult<String> {
        self.request(Method::Post, path, Some(body), false)
    }

    /// Sends one request and maps the outcome.
    ///
    /// # Errors
    ///
    /// - transport failure → [`SyncError::Transport`]
    /// - 401 → [`SyncError::AuthExpired`]
    /// - 404 → [`SyncError::NotFound`]
    /// - other non-2xx → [`SyncError::ServerRejected`]
    pub fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        attach_token: bool,
    ) -> SyncResult<String> {
        let url = format!("{}/{}", self.base_url, path);

        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if attach_token {
            if let Some(token) = self.tokens.access_token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };

        let response = self.http.send(&request).map_err(|e| {
            warn!(method = method.as_str(), path, error = %e, "transport failure");
            SyncError::Transport(e)
        })?;

        Self::map_response(response)
    }

    fn map_response(response: HttpResponse) -> SyncResult<String> {
        if response.is_success() {
            return Ok(response.body);
        }
        match response.status {
            401 => Err(SyncError::AuthExpired),
            404 => Err(SyncError::NotFound),
            status => Err(SyncError::ServerRejected {
                status,
                message: response.body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use savelink_store::MemoryStore;

    fn client(mock: Arc<MockHttpClient>) -> (RemoteClient, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStore::new())));
        (
            RemoteClient::new("https://play.example.com/", mock, Arc::clone(&tokens)),
            tokens,
        )
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let mock = Arc::new(MockHttpClient::new());
        mock.set_default_response(HttpResponse::ok(""));
        let (remote, _) = client(Arc::clone(&mock));

        remote.get("stats/acct1").unwrap();
        assert_eq!(
            mock.requests()[0].url,
            "https://play.example.com/stats/acct1"
        );
    }

    #[test]
    fn bearer_header_attached_when_token_present() {
        let mock = Arc::new(MockHttpClient::new());
        mock.set_default_response(HttpResponse::ok(""));
        let (remote, tokens) = client(Arc::clone(&mock));

        remote.get("characters").unwrap();
        assert_eq!(mock.requests()[0].header("Authorization"), None);

        tokens.set_tokens("tok123", None).unwrap();
        remote.get("characters").unwrap();
        assert_eq!(
            mock.requests()[1].header("Authorization"),
            Some("Bearer tok123")
        );
    }

    #[test]
    fn unauthenticated_post_never_attaches_token() {
        let mock = Arc::new(MockHttpClient::new());
        mock.set_default_response(HttpResponse::ok(""));
        let (remote, tokens) = client(Arc::clone(&mock));
        tokens.set_tokens("tok123", None).unwrap();

        remote.post_unauthenticated("login", "{}".into()).unwrap();
        let request = &mock.requests()[0];
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn status_mapping() {
        let mock = Arc::new(MockHttpClient::new());
        mock.enqueue(HttpResponse::with_status(401, ""));
        mock.enqueue(HttpResponse::with_status(404, ""));
        mock.enqueue(HttpResponse::with_status(500, "boom"));
        mock.enqueue_transport_error("unreachable");
        let (remote, _) = client(mock);

        assert!(matches!(remote.get("x"), Err(SyncError::AuthExpired)));
        assert!(matches!(remote.get("x"), Err(SyncError::NotFound)));
        assert!(matches!(
            remote.get("x"),
            Err(SyncError::ServerRejected { status: 500, .. })
        ));
        assert!(matches!(remote.get("x"), Err(SyncError::Transport(_))));
    }

    #[test]
    fn success_returns_body() {
        let mock = Arc::new(MockHttpClient::new());
        mock.enqueue(HttpResponse::ok("{\"ui_data\":\"[]\"}"));
        let (remote, _) = client(mock);

        assert_eq!(
            remote.get("inventory/acct1/MainScene").unwrap(),
            "{\"ui_data\":\"[]\"}"
        );
    }
}
