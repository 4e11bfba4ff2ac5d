//! HTTP client abstraction.
//!
//! The actual HTTP client is abstracted via a trait to allow
//! different implementations (reqwest, ureq, a game engine's web
//! request API) without this crate depending on any of them.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// HTTP method, restricted to what the protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// DELETE.
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// An HTTP request ready to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Full URL including the base address.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Returns the value of a header, if set.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response.
///
/// HTTP failure statuses are ordinary responses here; only
/// transport-level failures are errors of [`HttpClient::send`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a 200 response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Creates a response with an arbitrary status.
    #[must_use]
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. The contract
/// mirrors the protocol's needs: ordinary HTTP failure statuses (401,
/// 404, 5xx) must come back as an [`HttpResponse`] with the numeric
/// status preserved; `Err` is reserved for transport-level failures
/// (unreachable host, timeout, TLS).
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// A scripted HTTP client for testing.
///
/// Responses are served from a queue in order; once the queue is
/// empty the default response is served, if one is set. Every request
/// is recorded for inspection.
#[derive(Default)]
pub struct MockHttpClient {
    queue: Mutex<VecDeque<Result<HttpResponse, String>>>,
    default_response: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response to serve.
    pub fn enqueue(&self, response: HttpResponse) {
        self.queue.lock().push_back(Ok(response));
    }

    /// Queues a transport-level failure.
    pub fn enqueue_transport_error(&self, message: impl Into<String>) {
        self.queue.lock().push_back(Err(message.into()));
    }

    /// Sets the response served once the queue is exhausted.
    pub fn set_default_response(&self, response: HttpResponse) {
        *self.default_response.lock() = Some(response);
    }

    /// Returns copies of all requests seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        self.requests.lock().push(request.clone());

        if let Some(scripted) = self.queue.lock().pop_front() {
            return scripted;
        }
        self.default_response
            .lock()
            .clone()
            .ok_or_else(|| "no mock response queued".to_string())
    }
}
