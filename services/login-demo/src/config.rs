//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The OAuth client secret and the session signing secret are never read
//! from the TOML itself: the client secret comes from GOOGLE_CLIENT_SECRET
//! or `client_secret_file`, the signing secret optionally from JWT_SECRET.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub oauth: OAuthSection,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Timeout applied to the token and userinfo calls
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// Google client registration and session cookie settings
#[derive(Debug, Deserialize)]
pub struct OAuthSection {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to GOOGLE_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub jwt_secret: Option<Secret<String>>,
    /// Where `.simple-google-oauth.json` lives; working directory if unset
    #[serde(default)]
    pub secret_dir: Option<PathBuf>,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_http_timeout() -> u64 {
    30
}

fn default_login_path() -> String {
    "/login".into()
}

fn default_logout_path() -> String {
    "/logout".into()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. GOOGLE_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.oauth.redirect_uri.starts_with("http://")
            && !config.oauth.redirect_uri.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "redirect_uri must start with http:// or https://, got: {}",
                config.oauth.redirect_uri
            )));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.server.http_timeout_secs == 0 {
            return Err(common::Error::Config(
                "http_timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, route) in [
            ("login_path", &config.oauth.login_path),
            ("logout_path", &config.oauth.logout_path),
        ] {
            if !route.starts_with('/') {
                return Err(common::Error::Config(format!(
                    "{name} must start with '/', got: {route}"
                )));
            }
        }

        if let Ok(secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            config.oauth.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.oauth.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.oauth.client_secret = Some(Secret::new(secret));
            }
        }

        if config.oauth.client_secret.is_none() {
            return Err(common::Error::MissingSecret(
                "set GOOGLE_CLIENT_SECRET or oauth.client_secret_file".into(),
            ));
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.oauth.jwt_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("google-login-demo.toml")
    }
}
