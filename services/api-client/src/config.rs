//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Passwords are never read from the TOML: they come from a CLI flag or the
//! API_CLIENT_PASSWORD env var.

use common::Secret;
use serde::Deserialize;
use session_auth::{AUTH_ROUTE_MARKER, DEFAULT_LOGIN_PATH};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var consulted when a command needs a password and no flag was given
pub const PASSWORD_ENV: &str = "API_CLIENT_PASSWORD";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub store: StoreConfig,
}

/// Remote API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// API origin, e.g. `https://api.example.com`
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Session and refresh policy
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// URL substring identifying auth-subsystem routes
    #[serde(default = "default_route_marker")]
    pub route_marker: String,
    /// Where a forced logout redirects to
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Upper bound on a single refresh call; unbounded when unset
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            route_marker: default_route_marker(),
            login_path: default_login_path(),
            refresh_timeout_secs: None,
        }
    }
}

/// Credential persistence
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

fn default_timeout() -> u64 {
    30
}

fn default_route_marker() -> String {
    AUTH_ROUTE_MARKER.to_owned()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_owned()
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.auth.refresh_timeout_secs == Some(0) {
            return Err(common::Error::Config(
                "refresh_timeout_secs must be greater than 0 when set".into(),
            ));
        }

        if config.auth.route_marker.is_empty() {
            return Err(common::Error::Config(
                "route_marker must not be empty".into(),
            ));
        }

        if !config.auth.login_path.starts_with('/') {
            return Err(common::Error::Config(format!(
                "login_path must start with '/', got: {}",
                config.auth.login_path
            )));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_path {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("api-client.toml")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.auth.refresh_timeout_secs.map(Duration::from_secs)
    }
}

/// Resolve a password: the CLI flag wins, then API_CLIENT_PASSWORD.
pub fn resolve_password(flag: Option<&str>) -> common::Result<Secret<String>> {
    if let Some(p) = flag {
        return Ok(Secret::from(p));
    }
    match std::env::var(PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => Ok(Secret::new(p)),
        _ => Err(common::Error::Config(format!(
            "no password given: pass --password or set {PASSWORD_ENV}"
        ))),
    }
}
