//! Single-flight token refresh
//!
//! The coordinator turns any number of concurrent "my credential expired"
//! signals into exactly one call to the refresh endpoint. The first caller
//! becomes the leader and performs the refresh; callers arriving while it
//! runs become joiners and wait for the leader's result.
//!
//! Phases:
//! - Idle → Refreshing (first expiry; leader calls the refresh endpoint)
//! - Refreshing → Refreshing (further expiries register as joiners)
//! - Refreshing → Idle (refresh succeeded, failed, timed out, or the leader
//!   was dropped)
//!
//! The phase check and the transition happen under one short synchronous
//! lock that is never held across an `.await`, so two leaders cannot race
//! on a multi-threaded runtime either.
//!
//! Joiners register a one-shot receiver and only ever see the result of the
//! refresh that was running when they registered. On success every joiner
//! receives the same credential. On failure the senders are dropped and the
//! joiners observe `RefreshError::Abandoned`; only the leader sees the
//! actual refresh error and performs the forced logout.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use session_auth::{AuthApi, AuthResponse, Credential, CredentialStore};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{RefreshError, Result};
use crate::metrics;
use crate::session::{LogoutReason, SessionController};

enum Phase {
    Idle,
    Refreshing {
        joiners: Vec<oneshot::Sender<Credential>>,
    },
}

struct RefreshState {
    phase: Phase,
    /// Credential published by the most recent successful refresh. Cleared
    /// when a new refresh starts.
    last_result: Option<Credential>,
}

enum Role {
    Leader,
    Joiner(oneshot::Receiver<Credential>),
}

pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn AuthApi>,
    session: Arc<SessionController>,
    refresh_timeout: Option<Duration>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        auth: Arc<dyn AuthApi>,
        session: Arc<SessionController>,
    ) -> Self {
        Self {
            state: Mutex::new(RefreshState {
                phase: Phase::Idle,
                last_result: None,
            }),
            store,
            auth,
            session,
            refresh_timeout: None,
        }
    }

    /// Bound the refresh call. Exceeding the limit counts as a failed refresh.
    pub fn with_refresh_timeout(mut self, limit: Duration) -> Self {
        self.refresh_timeout = Some(limit);
        self
    }

    /// Start a refresh, or join the one already in flight.
    ///
    /// Leader: on success the new credential is stored and returned; on
    /// failure the store is cleared, the session is ended with reason
    /// `expired`, and the refresh error is returned.
    ///
    /// Joiner: returns the leader's credential, or `RefreshError::Abandoned`
    /// if the leader's refresh ended without one. Dropping a joiner has no
    /// effect on the running refresh.
    pub async fn begin_or_join(&self) -> Result<Credential> {
        match self.enter() {
            Role::Leader => self.lead().await,
            Role::Joiner(receiver) => {
                metrics::record_refresh("joined");
                debug!("refresh already in flight, waiting for its result");
                receiver.await.map_err(|_| RefreshError::Abandoned)
            }
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Refreshing { .. })
    }

    /// Number of callers waiting on the in-flight refresh.
    pub fn pending_joiners(&self) -> usize {
        match &self.state.lock().phase {
            Phase::Idle => 0,
            Phase::Refreshing { joiners } => joiners.len(),
        }
    }

    /// Credential published by the last successful refresh, if no refresh
    /// has started since.
    pub fn last_result(&self) -> Option<Credential> {
        self.state.lock().last_result.clone()
    }

    /// Check-and-set the phase in one critical section.
    fn enter(&self) -> Role {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Phase::Refreshing { joiners } = &mut state.phase {
            let (sender, receiver) = oneshot::channel();
            joiners.push(sender);
            return Role::Joiner(receiver);
        }
        state.phase = Phase::Refreshing {
            joiners: Vec::new(),
        };
        state.last_result = None;
        Role::Leader
    }

    async fn lead(&self) -> Result<Credential> {
        let flight = Flight {
            state: &self.state,
            landed: false,
        };
        metrics::record_refresh("started");
        info!("access token rejected, refreshing");

        match self.call_refresh().await {
            Ok(response) => {
                let credential = Credential::new(response.access_token);
                self.store.set(credential.clone());
                let joiners = flight.land(Some(&credential));
                let waiting = joiners.len();
                for joiner in joiners {
                    // A dropped receiver means that request was cancelled
                    let _ = joiner.send(credential.clone());
                }
                metrics::record_refresh("succeeded");
                info!(
                    joiners = waiting,
                    expires_in_secs = response.expires_in,
                    "access token refreshed"
                );
                Ok(credential)
            }
            Err(e) => {
                let joiners = flight.land(None);
                let waiting = joiners.len();
                metrics::record_refresh(match &e {
                    RefreshError::TimedOut(_) => "timed_out",
                    _ => "failed",
                });
                warn!(error = %e, joiners = waiting, "token refresh failed, ending session");
                self.store.clear();
                self.session.logout_and_redirect(LogoutReason::Expired);
                // Joiners are released only after the session is gone
                drop(joiners);
                Err(e)
            }
        }
    }

    async fn call_refresh(&self) -> Result<AuthResponse> {
        match self.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, self.auth.refresh())
                .await
                .map_err(|_| RefreshError::TimedOut(limit))?
                .map_err(RefreshError::from),
            None => self.auth.refresh().await.map_err(RefreshError::from),
        }
    }
}

/// Returns the coordinator to Idle when the leader finishes, including when
/// the leader's future is dropped mid-refresh.
struct Flight<'a> {
    state: &'a Mutex<RefreshState>,
    landed: bool,
}

impl Flight<'_> {
    /// Go Idle, record a successful result, and hand back the joiners.
    fn land(mut self, result: Option<&Credential>) -> Vec<oneshot::Sender<Credential>> {
        self.landed = true;
        let mut state = self.state.lock();
        if let Some(credential) = result {
            state.last_result = Some(credential.clone());
        }
        match std::mem::replace(&mut state.phase, Phase::Idle) {
            Phase::Refreshing { joiners } => joiners,
            Phase::Idle => Vec::new(),
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if self.landed {
            return;
        }
        let mut state = self.state.lock();
        let abandoned = match std::mem::replace(&mut state.phase, Phase::Idle) {
            Phase::Refreshing { joiners } => joiners.len(),
            Phase::Idle => 0,
        };
        drop(state);
        metrics::record_refresh("abandoned");
        warn!(joiners = abandoned, "refresh cancelled before completion");
    }
}
