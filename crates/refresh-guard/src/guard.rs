//! Request pipeline guard
//!
//! Every outgoing API request goes through `RequestGuard::handle`:
//! 1. Auth-subsystem routes are sent untouched (no credential, no refresh)
//! 2. Otherwise the stored credential, if any, is attached as
//!    `Authorization: Bearer <token>` on a copy of the request
//! 3. A 401 on a request that carried a bearer credential hands off to the
//!    refresh coordinator; the original request is replayed exactly once
//!    with the credential it returns
//!
//! Every other failure is returned unchanged. A 401 on the replay is final.

use std::sync::Arc;

use session_auth::{AUTH_ROUTE_MARKER, Credential, CredentialStore, is_auth_route};
use tracing::{debug, info, instrument, warn};
use transport::header::{AUTHORIZATION, HeaderValue};
use transport::{ApiRequest, ApiResponse, Transport, TransportError};

use crate::classify::classify_failure;
use crate::coordinator::RefreshCoordinator;
use crate::error::{GuardError, RefreshError};
use crate::metrics;

pub struct RequestGuard {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    auth_route_marker: String,
}

impl RequestGuard {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
            auth_route_marker: AUTH_ROUTE_MARKER.to_owned(),
        }
    }

    /// Override the URL substring that marks auth-subsystem routes.
    pub fn with_auth_route_marker(mut self, marker: impl Into<String>) -> Self {
        self.auth_route_marker = marker.into();
        self
    }

    /// Send `request`, refreshing the credential and replaying once if it
    /// was rejected as expired.
    ///
    /// When the refresh this request started fails, the session has already
    /// been ended by the time `GuardError::RefreshFailed` is returned.
    pub async fn handle(&self, request: ApiRequest) -> Result<ApiResponse, GuardError> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        self.dispatch(request, request_id).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %request.method, path = %request.path()))]
    async fn dispatch(
        &self,
        request: ApiRequest,
        request_id: String,
    ) -> Result<ApiResponse, GuardError> {
        if is_auth_route(&request.url, &self.auth_route_marker) {
            debug!("auth route, sending without credential");
            return Ok(self.transport.send(request).await?);
        }

        let outgoing = match self.store.get() {
            Some(credential) => with_bearer(&request, &credential)?,
            None => request.clone(),
        };
        let carried_bearer = outgoing.bearer_token().is_some();

        let original = match self.transport.send(outgoing).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let class = classify_failure(&original, carried_bearer);
        if !class.is_refreshable() {
            debug!(failure = class.label(), error = %original, "request failed");
            return Err(original.into());
        }

        let credential = match self.coordinator.begin_or_join().await {
            Ok(credential) => credential,
            Err(RefreshError::Abandoned) => {
                debug!("refresh ended without a credential, returning original failure");
                return Err(original.into());
            }
            Err(source) => return Err(GuardError::RefreshFailed { original, source }),
        };

        match self.transport.send(with_bearer(&request, &credential)?).await {
            Ok(response) => {
                metrics::record_retry("recovered");
                info!(status = response.status, "request recovered after token refresh");
                Ok(response)
            }
            Err(e) if e.is_unauthorized() => {
                metrics::record_retry("rejected");
                warn!("refreshed token rejected, giving up");
                Err(e.into())
            }
            Err(e) => {
                metrics::record_retry("failed");
                debug!(error = %e, "retry after token refresh failed");
                Err(e.into())
            }
        }
    }
}

/// Copy of `request` carrying `credential` as its only `Authorization` value.
fn with_bearer(request: &ApiRequest, credential: &Credential) -> transport::Result<ApiRequest> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", credential.expose())).map_err(|_| {
            TransportError::InvalidRequest("credential is not a valid header value".into())
        })?;
    value.set_sensitive(true);

    let mut request = request.clone();
    request.headers.insert(AUTHORIZATION, value);
    Ok(request)
}
