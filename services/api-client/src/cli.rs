//! Command-line interface

use std::path::PathBuf;

use anyhow::{Context, Result};
use transport::Method;

#[derive(Debug, clap::Parser)]
#[command(name = "api-client", version, about = "API client with transparent token refresh")]
pub struct Cli {
    /// Path to the TOML config file (falls back to CONFIG_PATH, then api-client.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Show whether a session credential is stored.
    Status,
    /// Log in and store the returned access token.
    Login(LoginArgs),
    /// Create an account and log in.
    Register(RegisterArgs),
    /// End the session locally and, best-effort, on the server.
    Logout,
    /// Request a password reset email.
    ForgotPassword(ForgotPasswordArgs),
    /// Set a new password using a reset token.
    ResetPassword(ResetPasswordArgs),
    /// Send an authenticated API request.
    Request(RequestArgs),
}

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    /// Password (falls back to API_CLIENT_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,
    /// Ask the server for a long-lived refresh cookie
    #[arg(long)]
    pub remember_me: bool,
}

#[derive(Debug, clap::Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    /// Password (falls back to API_CLIENT_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct ForgotPasswordArgs {
    #[arg(long)]
    pub email: String,
}

#[derive(Debug, clap::Args)]
pub struct ResetPasswordArgs {
    /// Token from the reset email
    #[arg(long)]
    pub token: String,
    /// New password (falls back to API_CLIENT_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    /// HTTP method, e.g. GET or POST
    pub method: String,
    /// Path relative to the API base URL, e.g. /api/expenses
    pub path: String,
    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,
}

impl RequestArgs {
    pub fn method(&self) -> Result<Method> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method: {}", self.method))
    }

    pub fn body(&self) -> Result<Option<serde_json::Value>> {
        self.body
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .context("--body must be valid JSON")
    }

    /// Absolute URL for `path` under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{base}{}", self.path)
        } else {
            format!("{base}/{}", self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_login_with_global_flags() {
        let cli = Cli::try_parse_from([
            "api-client",
            "login",
            "--email",
            "ana@example.com",
            "--remember-me",
            "--config",
            "/etc/api-client.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/api-client.toml")));
        assert!(!cli.print_metrics);
        match cli.command {
            Command::Login(args) => {
                assert_eq!(args.email, "ana@example.com");
                assert!(args.password.is_none());
                assert!(args.remember_me);
            }
            other => panic!("expected login, got {other:?}"),
        }
    }

    #[test]
    fn parses_request() {
        let cli = Cli::try_parse_from([
            "api-client",
            "--print-metrics",
            "request",
            "post",
            "/api/expenses",
            "--body",
            r#"{"amount":12}"#,
        ])
        .unwrap();

        assert!(cli.print_metrics);
        let Command::Request(args) = cli.command else {
            panic!("expected request");
        };
        assert_eq!(args.method().unwrap(), Method::POST);
        assert_eq!(args.body().unwrap(), Some(serde_json::json!({"amount": 12})));
        assert_eq!(
            args.url("https://api.example.com/"),
            "https://api.example.com/api/expenses"
        );
    }

    #[test]
    fn request_path_without_leading_slash() {
        let args = RequestArgs {
            method: "get".into(),
            path: "api/budgets".into(),
            body: None,
        };
        assert_eq!(args.url("http://localhost:8080"), "http://localhost:8080/api/budgets");
        assert_eq!(args.body().unwrap(), None);
    }

    #[test]
    fn rejects_invalid_body_and_method() {
        let args = RequestArgs {
            method: "NOT A METHOD".into(),
            path: "/x".into(),
            body: Some("{oops".into()),
        };
        assert!(args.method().is_err());
        assert!(args.body().is_err());
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["api-client"]).is_err());
    }
}
