//! Auth endpoint client
//!
//! Plain request/response calls against `<origin>/api/auth/*`. Every call is
//! sent `with_credentials` so the HTTP-only refresh cookie set by login and
//! register travels back on refresh and logout. Responses use camelCase JSON
//! (`accessToken`, `expiresIn`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use common::Secret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;
use transport::{ApiRequest, Transport};

use crate::constants::{
    AUTH_BASE_PATH, FORGOT_PASSWORD_ENDPOINT, LOGIN_ENDPOINT, LOGOUT_ENDPOINT, REFRESH_ENDPOINT,
    REGISTER_ENDPOINT, RESET_PASSWORD_ENDPOINT,
};
use crate::error::{Error, Result};

fn expose_secret<S: Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: Secret<String>,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordPayload {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub token: String,
    #[serde(serialize_with = "expose_secret")]
    pub new_password: Secret<String>,
}

/// Response from login, register, and refresh.
///
/// `expires_in` is informational only: expiry is detected from a 401, not
/// scheduled from this value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Remote authentication endpoints.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn AuthApi>`).
pub trait AuthApi: Send + Sync {
    fn login(&self, payload: LoginPayload) -> AuthFuture<'_, AuthResponse>;

    fn register(&self, payload: RegisterPayload) -> AuthFuture<'_, AuthResponse>;

    /// Trade the refresh cookie for a new access token.
    fn refresh(&self) -> AuthFuture<'_, AuthResponse>;

    fn logout(&self) -> AuthFuture<'_, ()>;

    fn forgot_password(&self, payload: ForgotPasswordPayload) -> AuthFuture<'_, OkResponse>;

    fn reset_password(&self, payload: ResetPasswordPayload) -> AuthFuture<'_, OkResponse>;
}

/// `AuthApi` over any `Transport`.
///
/// Talks to the transport directly; the request guard's auth-route exemption
/// means going through it would be equivalent.
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl AuthClient {
    /// `api_origin` is the API base URL, e.g. `https://api.example.com`.
    pub fn new(transport: Arc<dyn Transport>, api_origin: &str) -> Self {
        Self {
            transport,
            base_url: format!("{}{AUTH_BASE_PATH}", api_origin.trim_end_matches('/')),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<String> {
        let request = ApiRequest::post(self.url(endpoint), body).with_credentials();
        debug!(endpoint, "calling auth endpoint");
        let response = self.transport.send(request).await?;
        Ok(response.body)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let body = self.post(endpoint, body).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("{endpoint} response: {e}")))
    }
}

fn to_body<T: Serialize>(payload: &T) -> Result<serde_json::Value> {
    serde_json::to_value(payload)
        .map_err(|e| Error::InvalidResponse(format!("encoding payload: {e}")))
}

impl AuthApi for AuthClient {
    fn login(&self, payload: LoginPayload) -> AuthFuture<'_, AuthResponse> {
        Box::pin(async move { self.post_json(LOGIN_ENDPOINT, to_body(&payload)?).await })
    }

    fn register(&self, payload: RegisterPayload) -> AuthFuture<'_, AuthResponse> {
        Box::pin(async move { self.post_json(REGISTER_ENDPOINT, to_body(&payload)?).await })
    }

    fn refresh(&self) -> AuthFuture<'_, AuthResponse> {
        Box::pin(async move { self.post_json(REFRESH_ENDPOINT, serde_json::json!({})).await })
    }

    fn logout(&self) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            self.post(LOGOUT_ENDPOINT, serde_json::json!({})).await?;
            Ok(())
        })
    }

    fn forgot_password(&self, payload: ForgotPasswordPayload) -> AuthFuture<'_, OkResponse> {
        Box::pin(async move {
            self.post_json(FORGOT_PASSWORD_ENDPOINT, to_body(&payload)?)
                .await
        })
    }

    fn reset_password(&self, payload: ResetPasswordPayload) -> AuthFuture<'_, OkResponse> {
        Box::pin(async move {
            self.post_json(RESET_PASSWORD_ENDPOINT, to_body(&payload)?)
                .await
        })
    }
}
