//! Error types for authentication operations

use transport::TransportError;

/// Errors from auth endpoint calls and credential persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("auth request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid auth response: {0}")]
    InvalidResponse(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// HTTP status of a rejected auth call, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
