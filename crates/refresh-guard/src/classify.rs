//! Refresh eligibility for failed requests
//!
//! Only one kind of failure enters the refresh protocol: an HTTP 401 on a
//! request that carried a bearer credential. Everything else (network
//! errors, other statuses, 401 on an anonymous request) is propagated as-is.

use transport::{TransportError, UNAUTHORIZED};

/// How a failed request relates to credential expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// No HTTP response (connect failure, timeout, malformed request)
    NotHttp,
    /// HTTP error other than 401
    OtherStatus(u16),
    /// 401 on a request that carried no bearer credential
    Anonymous,
    /// 401 on a request that carried a bearer credential
    Expired,
}

impl FailureClass {
    /// Label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            FailureClass::NotHttp => "not_http",
            FailureClass::OtherStatus(_) => "other_status",
            FailureClass::Anonymous => "anonymous",
            FailureClass::Expired => "expired",
        }
    }

    pub fn is_refreshable(&self) -> bool {
        matches!(self, FailureClass::Expired)
    }
}

/// Classify a request failure. `carried_bearer` is whether the request as
/// sent had an `Authorization: Bearer` header.
pub fn classify_failure(err: &TransportError, carried_bearer: bool) -> FailureClass {
    match err.status() {
        None => FailureClass::NotHttp,
        Some(UNAUTHORIZED) if carried_bearer => FailureClass::Expired,
        Some(UNAUTHORIZED) => FailureClass::Anonymous,
        Some(status) => FailureClass::OtherStatus(status),
    }
}
