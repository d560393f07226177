//! Session controller
//!
//! Owns the application-facing view of the session: whether a credential
//! exists, storing one after login, and ending the session. A forced logout
//! clears the credential and sends the user to the unauthenticated entry
//! point with a reason, e.g. `/login?reason=expired`.
//!
//! Logged-in means a credential exists, not that it is still valid.

use std::sync::Arc;

use common::Secret;
use session_auth::{
    AuthApi, Credential, CredentialStore, DEFAULT_LOGIN_PATH, LoginPayload, RegisterPayload,
};
use tracing::{debug, info, warn};

/// Why a session was ended by the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogoutReason {
    /// The credential expired and could not be refreshed
    #[default]
    Expired,
    Unauthorized,
}

impl LogoutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::Expired => "expired",
            LogoutReason::Unauthorized => "unauthorized",
        }
    }
}

/// Result of a user-initiated logout.
///
/// Local session state is authoritative: the remote call is best-effort and
/// its failure is reported here instead of as an error. Either way the local
/// session is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    RemoteConfirmed,
    RemoteFailed(String),
}

/// Moves the user to another location (a route, a page, a prompt).
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

pub struct SessionController {
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        auth: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            auth,
            navigator,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
        }
    }

    /// Override the unauthenticated entry point (default `/login`).
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.exists()
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        self.store.set(Credential::new(token));
    }

    pub fn clear_session(&self) {
        self.store.clear();
    }

    /// Clear the session, then navigate to the login entry point carrying
    /// `reason` as a query parameter.
    pub fn logout_and_redirect(&self, reason: LogoutReason) {
        self.clear_session();
        let target = format!("{}?reason={}", self.login_path, reason.as_str());
        info!(reason = reason.as_str(), %target, "session ended, redirecting to login");
        self.navigator.navigate(&target);
    }

    /// Best-effort remote logout followed by an unconditional local clear.
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = match self.auth.logout().await {
            Ok(()) => LogoutOutcome::RemoteConfirmed,
            Err(e) => {
                warn!(error = %e, "remote logout failed, clearing local session anyway");
                LogoutOutcome::RemoteFailed(e.to_string())
            }
        };
        self.clear_session();
        debug!(?outcome, "logged out");
        outcome
    }

    /// Log in and store the returned access token.
    ///
    /// On failure the store is left untouched.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: Secret<String>,
        remember_me: bool,
    ) -> session_auth::Result<()> {
        let response = self
            .auth
            .login(LoginPayload {
                email: email.into(),
                password,
                remember_me,
            })
            .await?;
        self.set_access_token(response.access_token);
        info!(expires_in_secs = response.expires_in, "logged in");
        Ok(())
    }

    /// Register a new account and store the returned access token.
    pub async fn register(
        &self,
        email: impl Into<String>,
        password: Secret<String>,
    ) -> session_auth::Result<()> {
        let response = self
            .auth
            .register(RegisterPayload {
                email: email.into(),
                password,
            })
            .await?;
        self.set_access_token(response.access_token);
        info!(expires_in_secs = response.expires_in, "registered and logged in");
        Ok(())
    }
}
