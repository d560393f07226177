//! reqwest-backed transport.
//!
//! Holds two clients: one with a cookie jar for requests flagged
//! `with_credentials` (the refresh cookie lives there), one without for
//! everything else. Both share the configured timeout.

use crate::{ApiRequest, ApiResponse, Result, Transport, TransportError};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

pub struct ReqwestTransport {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let credentialed = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("building HTTP client: {e}")))?;
        let anonymous = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("building HTTP client: {e}")))?;
        Ok(Self {
            credentialed,
            anonymous,
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + '_>> {
        Box::pin(async move {
            let path = request.path().to_owned();
            let ApiRequest {
                method,
                url,
                headers,
                body,
                with_credentials,
            } = request;

            let client = if with_credentials {
                &self.credentialed
            } else {
                &self.anonymous
            };

            let mut builder = client.request(method.clone(), &url).headers(headers);
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_builder() {
                    TransportError::InvalidRequest(e.to_string())
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Network(format!("reading response body: {e}")))?;

            debug!(
                %method,
                path = %path,
                status = status.as_u16(),
                "response received"
            );

            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(ApiResponse {
                status: status.as_u16(),
                headers,
                body,
            })
        })
    }
}
