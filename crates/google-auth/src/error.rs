//! Error types for login and session operations

/// Errors from the OAuth exchange, the secret file and session tokens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("userinfo request failed: {0}")]
    UserInfo(String),

    #[error("invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("secret file parse error: {0}")]
    SecretParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("session signing failed: {0}")]
    Signing(String),

    #[error("invalid session token: {0}")]
    InvalidSession(String),

    #[error("session token expired")]
    SessionExpired,
}

/// Result alias for login operations.
pub type Result<T> = std::result::Result<T, Error>;
