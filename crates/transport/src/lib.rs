//! HTTP transport abstraction for outgoing API requests
//!
//! Defines the `Transport` trait that decouples request policy (credential
//! attachment, refresh-and-retry) from the HTTP client doing the I/O.
//! `ReqwestTransport` is the production implementation; tests substitute
//! scripted fakes behind the same trait.
//!
//! Any non-2xx response is surfaced as `TransportError::Status` so callers
//! can inspect the status code without touching the response type.

pub mod reqwest_transport;

pub use reqwest::Method;
pub use reqwest::header;
pub use reqwest_transport::ReqwestTransport;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;

/// Status code signalling an expired or missing credential.
pub const UNAUTHORIZED: u16 = 401;

/// An HTTP-shaped outgoing request.
///
/// Cheap to clone; the request policy never mutates a request in place and
/// instead derives credentialed copies from the caller's original.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Send cookies (e.g. the HTTP-only refresh cookie) with this request
    pub with_credentials: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            with_credentials: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).json(body)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark the request as carrying cookies.
    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    /// Path component of the URL, for logging. Falls back to the full URL
    /// when it has no scheme.
    pub fn path(&self) -> &str {
        match self.url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
            None => &self.url,
        }
    }

    /// Token of the `Authorization: Bearer <token>` header, if present.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| TransportError::InvalidResponse(format!("decoding JSON body: {e}")))
    }
}

/// Errors from sending a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No HTTP response was received (connect failure, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// HTTP status code, for HTTP-level errors only.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Sends requests and receives responses.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest)
    -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn bearer_token_reads_authorization_header() {
        let mut request = ApiRequest::get("http://localhost/api/expenses");
        assert_eq!(request.bearer_token(), None);

        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer at_1"));
        assert_eq!(request.bearer_token(), Some("at_1"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let mut request = ApiRequest::get("http://localhost/api/expenses");
        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn path_strips_scheme_and_host() {
        assert_eq!(
            ApiRequest::get("https://api.example.com/api/auth/refresh").path(),
            "/api/auth/refresh"
        );
        assert_eq!(ApiRequest::get("https://api.example.com").path(), "/");
        assert_eq!(ApiRequest::get("/api/expenses").path(), "/api/expenses");
    }

    #[test]
    fn post_sets_json_body() {
        let request = ApiRequest::post("http://h/api/x", serde_json::json!({"a": 1}));
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(serde_json::json!({"a": 1})));
        assert!(!request.with_credentials);
        assert!(request.with_credentials().with_credentials);
    }

    #[test]
    fn only_http_errors_have_status() {
        let http = TransportError::Status {
            status: 401,
            body: "expired".into(),
        };
        assert_eq!(http.status(), Some(401));
        assert!(http.is_unauthorized());

        let forbidden = TransportError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(!forbidden.is_unauthorized());

        let network = TransportError::Network("connection refused".into());
        assert_eq!(network.status(), None);
        assert!(!network.is_unauthorized());
    }

    #[test]
    fn response_json_decodes_body() {
        let response = ApiResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: r#"{"ok":true}"#.into(),
        };
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);

        let bad = ApiResponse {
            body: "not json".into(),
            ..response
        };
        assert!(matches!(
            bad.json::<serde_json::Value>(),
            Err(TransportError::InvalidResponse(_))
        ));
    }
}
