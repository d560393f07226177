//! Terminal navigator
//!
//! A CLI has no routes to move to, so a forced logout is reported on stderr
//! with the target the user would have been sent to.

use refresh_guard::Navigator;
use tracing::warn;

pub struct TerminalNavigator;

impl TerminalNavigator {
    fn message(target: &str) -> String {
        format!("session ended ({target}); run `api-client login` to sign in again")
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, target: &str) {
        warn!(%target, "redirecting to login");
        eprintln!("{}", Self::message(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_target_and_next_step() {
        let message = TerminalNavigator::message("/login?reason=expired");
        assert!(message.contains("/login?reason=expired"));
        assert!(message.contains("api-client login"));
    }

    #[test]
    fn navigate_does_not_panic() {
        TerminalNavigator.navigate("/login?reason=expired");
    }
}
