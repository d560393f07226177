//! Error types for refresh coordination and guarded requests

use std::time::Duration;

use transport::TransportError;

/// Why a refresh did not produce a credential.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The refresh endpoint rejected the call or could not be reached
    #[error("token refresh failed: {0}")]
    Auth(#[from] session_auth::Error),

    #[error("token refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// Seen by joiners only: the refresh they waited on ended without a
    /// credential (it failed, or its initiator was cancelled)
    #[error("token refresh abandoned")]
    Abandoned,
}

/// Failure of a request sent through the guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The request failed and was not recovered by a refresh
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request hit 401, and the refresh it started failed. The session has
    /// already been cleared when this is returned.
    #[error("session expired and token refresh failed: {source}")]
    RefreshFailed {
        original: TransportError,
        #[source]
        source: RefreshError,
    },
}

impl GuardError {
    /// HTTP status of the request's own failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GuardError::Transport(e) => e.status(),
            GuardError::RefreshFailed { original, .. } => original.status(),
        }
    }

    /// Whether the session was ended because of this failure.
    pub fn ended_session(&self) -> bool {
        matches!(self, GuardError::RefreshFailed { .. })
    }
}

/// Result alias for refresh operations.
pub type Result<T> = std::result::Result<T, RefreshError>;
