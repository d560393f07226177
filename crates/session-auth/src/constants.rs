//! Auth subsystem routes
//!
//! Requests whose URL contains `AUTH_ROUTE_MARKER` belong to the auth
//! subsystem: they never carry the bearer credential and never trigger a
//! refresh, which keeps the refresh call from recursing into itself.

/// URL substring identifying auth-subsystem routes
pub const AUTH_ROUTE_MARKER: &str = "/api/auth/";

/// Base path of the auth endpoints, relative to the API origin
pub const AUTH_BASE_PATH: &str = "/api/auth";

pub const LOGIN_ENDPOINT: &str = "login";
pub const REGISTER_ENDPOINT: &str = "register";
pub const REFRESH_ENDPOINT: &str = "refresh";
pub const LOGOUT_ENDPOINT: &str = "logout";
pub const FORGOT_PASSWORD_ENDPOINT: &str = "forgot-password";
pub const RESET_PASSWORD_ENDPOINT: &str = "reset-password";

/// Unauthenticated entry point the session is redirected to on forced logout
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Whether `url` targets the auth subsystem.
pub fn is_auth_route(url: &str, marker: &str) -> bool {
    url.contains(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_routes_match_by_substring() {
        assert!(is_auth_route(
            "https://api.example.com/api/auth/refresh",
            AUTH_ROUTE_MARKER
        ));
        assert!(is_auth_route("/api/auth/login", AUTH_ROUTE_MARKER));
        assert!(!is_auth_route(
            "https://api.example.com/api/expenses",
            AUTH_ROUTE_MARKER
        ));
        // Base path without trailing slash is not an auth route
        assert!(!is_auth_route("https://api.example.com/api/auth", AUTH_ROUTE_MARKER));
    }
}
