//! Component wiring and command execution
//!
//! One `App` per process: a single credential store, auth client, session
//! controller, refresh coordinator, and request guard, all sharing the same
//! transport so the refresh cookie set by login is sent on refresh.

use std::sync::Arc;

use anyhow::{Context, Result};
use refresh_guard::{
    LogoutOutcome, Navigator, RefreshCoordinator, RequestGuard, SessionController,
};
use session_auth::{
    AuthApi, AuthClient, CredentialStore, ForgotPasswordPayload, ResetPasswordPayload,
};
use tracing::info;
use transport::{ApiRequest, Transport};

use crate::cli::{Command, RequestArgs};
use crate::config::{Config, resolve_password};

pub struct App {
    base_url: String,
    auth: Arc<dyn AuthApi>,
    session: Arc<SessionController>,
    guard: RequestGuard,
}

impl App {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let auth: Arc<dyn AuthApi> = Arc::new(AuthClient::new(transport.clone(), &config.api.base_url));
        let session = Arc::new(
            SessionController::new(store.clone(), auth.clone(), navigator)
                .with_login_path(config.auth.login_path.clone()),
        );

        let mut coordinator = RefreshCoordinator::new(store.clone(), auth.clone(), session.clone());
        if let Some(limit) = config.refresh_timeout() {
            coordinator = coordinator.with_refresh_timeout(limit);
        }

        let guard = RequestGuard::new(transport, store, Arc::new(coordinator))
            .with_auth_route_marker(config.auth.route_marker.clone());

        Self {
            base_url: config.api.base_url.clone(),
            auth,
            session,
            guard,
        }
    }

    /// Run one command and return what should be printed on stdout.
    pub async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Status => Ok(if self.session.is_logged_in() {
                "logged in".to_owned()
            } else {
                "logged out".to_owned()
            }),
            Command::Login(args) => {
                let password = resolve_password(args.password.as_deref())?;
                self.session
                    .login(args.email, password, args.remember_me)
                    .await
                    .context("login failed")?;
                Ok("logged in".to_owned())
            }
            Command::Register(args) => {
                let password = resolve_password(args.password.as_deref())?;
                self.session
                    .register(args.email, password)
                    .await
                    .context("registration failed")?;
                Ok("registered and logged in".to_owned())
            }
            Command::Logout => Ok(match self.session.logout().await {
                LogoutOutcome::RemoteConfirmed => "logged out".to_owned(),
                LogoutOutcome::RemoteFailed(reason) => {
                    format!("logged out locally (server logout failed: {reason})")
                }
            }),
            Command::ForgotPassword(args) => {
                self.auth
                    .forgot_password(ForgotPasswordPayload { email: args.email })
                    .await
                    .context("forgot-password request failed")?;
                Ok("if the account exists, a reset email is on its way".to_owned())
            }
            Command::ResetPassword(args) => {
                let new_password = resolve_password(args.password.as_deref())?;
                self.auth
                    .reset_password(ResetPasswordPayload {
                        token: args.token,
                        new_password,
                    })
                    .await
                    .context("password reset failed")?;
                Ok("password updated".to_owned())
            }
            Command::Request(args) => self.request(&args).await,
        }
    }

    async fn request(&self, args: &RequestArgs) -> Result<String> {
        let mut request = ApiRequest::new(args.method()?, args.url(&self.base_url));
        if let Some(body) = args.body()? {
            request = request.json(body);
        }

        let response = self.guard.handle(request).await.context("request failed")?;
        info!(status = response.status, bytes = response.body.len(), "request completed");
        Ok(response.body)
    }
}
