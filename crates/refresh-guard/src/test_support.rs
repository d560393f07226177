//! Scripted fakes for the transport, auth endpoints, and navigator.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use session_auth::{
    AuthApi, AuthResponse, ForgotPasswordPayload, LoginPayload, OkResponse, RegisterPayload,
    ResetPasswordPayload,
};
use tokio::sync::Semaphore;
use transport::{ApiRequest, ApiResponse, Transport, TransportError};

use crate::session::Navigator;

type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = session_auth::Result<T>> + Send + 'a>>;

fn status(code: u16) -> TransportError {
    TransportError::Status {
        status: code,
        body: format!("status {code}"),
    }
}

/// Auth endpoints with canned replies. `hold_refresh()` parks every refresh
/// call until `release_refresh()` is called.
pub struct FakeAuth {
    refresh_reply: Mutex<Result<String, TransportError>>,
    login_reply: Mutex<Result<String, TransportError>>,
    logout_fails: AtomicBool,
    held: AtomicBool,
    gate: Semaphore,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl FakeAuth {
    pub fn succeeding(token: &str) -> Arc<Self> {
        Arc::new(Self {
            refresh_reply: Mutex::new(Ok(token.to_owned())),
            login_reply: Mutex::new(Ok("at_login".to_owned())),
            logout_fails: AtomicBool::new(false),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        })
    }

    /// Refresh and login both answer with `code`.
    pub fn failing(code: u16) -> Arc<Self> {
        let auth = Self::succeeding("unused");
        *auth.refresh_reply.lock() = Err(status(code));
        *auth.login_reply.lock() = Err(status(code));
        auth
    }

    pub fn set_login_token(&self, token: &str) {
        *self.login_reply.lock() = Ok(token.to_owned());
    }

    pub fn fail_logout(&self) {
        self.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn hold_refresh(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let one held refresh call proceed.
    pub fn release_refresh(&self) {
        self.gate.add_permits(1);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn token_reply(reply: &Mutex<Result<String, TransportError>>) -> session_auth::Result<AuthResponse> {
        reply
            .lock()
            .clone()
            .map(|access_token| AuthResponse {
                access_token,
                expires_in: 900,
            })
            .map_err(session_auth::Error::from)
    }
}

impl AuthApi for FakeAuth {
    fn login(&self, _payload: LoginPayload) -> AuthFuture<'_, AuthResponse> {
        let reply = Self::token_reply(&self.login_reply);
        Box::pin(async move { reply })
    }

    fn register(&self, _payload: RegisterPayload) -> AuthFuture<'_, AuthResponse> {
        let reply = Self::token_reply(&self.login_reply);
        Box::pin(async move { reply })
    }

    fn refresh(&self) -> AuthFuture<'_, AuthResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if self.held.load(Ordering::SeqCst) {
                self.gate
                    .acquire()
                    .await
                    .expect("gate is never closed")
                    .forget();
            }
            Self::token_reply(&self.refresh_reply)
        })
    }

    fn logout(&self) -> AuthFuture<'_, ()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let reply = if self.logout_fails.load(Ordering::SeqCst) {
            Err(TransportError::Network("connection refused".into()).into())
        } else {
            Ok(())
        };
        Box::pin(async move { reply })
    }

    fn forgot_password(&self, _payload: ForgotPasswordPayload) -> AuthFuture<'_, OkResponse> {
        Box::pin(async { Ok(OkResponse { ok: true }) })
    }

    fn reset_password(&self, _payload: ResetPasswordPayload) -> AuthFuture<'_, OkResponse> {
        Box::pin(async { Ok(OkResponse { ok: true }) })
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> transport::Result<ApiResponse> + Send + Sync>;

/// Transport that answers through a closure and records every request.
pub struct ScriptedTransport {
    responder: Responder,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&ApiRequest) -> transport::Result<ApiResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Accepts only requests bearing `valid_token`, 401 otherwise.
    pub fn accepting(valid_token: &'static str) -> Arc<Self> {
        Self::new(move |request| match request.bearer_token() {
            Some(token) if token == valid_token => Ok(ok_response()),
            _ => Err(status(401)),
        })
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().clone()
    }

    /// Bearer token of each sent request, in order.
    pub fn sent_tokens(&self) -> Vec<Option<String>> {
        self.sent
            .lock()
            .iter()
            .map(|r| r.bearer_token().map(str::to_owned))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = transport::Result<ApiResponse>> + Send + '_>> {
        let reply = (self.responder)(&request);
        self.sent.lock().push(request);
        Box::pin(async move { reply })
    }
}

pub fn ok_response() -> ApiResponse {
    ApiResponse {
        status: 200,
        headers: Default::default(),
        body: r#"{"ok":true}"#.into(),
    }
}

pub fn error_status(code: u16) -> TransportError {
    status(code)
}

#[derive(Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.targets.lock().push(target.to_owned());
    }
}

/// Yield to other futures on this task until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}
