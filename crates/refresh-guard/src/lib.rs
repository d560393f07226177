//! Transparent bearer-token refresh for API requests
//!
//! `RequestGuard` attaches the stored access token to outgoing requests. When
//! a request comes back 401, `RefreshCoordinator` makes sure only one refresh
//! call is in flight no matter how many requests expired at once; everyone
//! else waits for its result. The guard then replays each request once with
//! the new token.
//!
//! If the refresh fails, the coordinator clears the token and ends the
//! session through `SessionController::logout_and_redirect` before any
//! caller sees the error.
//!
//! Wiring, outermost first:
//! ```text
//! RequestGuard ──► Transport
//!     │
//!     └──► RefreshCoordinator ──► AuthApi::refresh
//!              │
//!              └──► SessionController ──► Navigator
//! ```

pub mod classify;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod session;

#[cfg(test)]
mod test_support;

pub use classify::{FailureClass, classify_failure};
pub use coordinator::RefreshCoordinator;
pub use error::{GuardError, RefreshError, Result};
pub use guard::RequestGuard;
pub use session::{LogoutOutcome, LogoutReason, Navigator, SessionController};
