//! Authorization code exchange and userinfo fetch
//!
//! The two server-to-server calls of the callback, in order:
//! 1. POST the code to the token endpoint (form-encoded, with the client
//!    secret) to obtain an access token
//! 2. GET the userinfo endpoint with that token as a bearer credential
//!
//! Neither call is retried. Timeouts are whatever the supplied
//! `reqwest::Client` was built with.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OAuthConfig;
use crate::error::{Error, Result};
use crate::profile::UserProfile;

/// Response from the token endpoint.
///
/// Only `access_token` is used; refresh tokens are ignored since sessions
/// are never refreshed.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(&config.endpoints().token)
        .form(&[
            ("code", code),
            ("client_id", config.client_id()),
            ("client_secret", config.client_secret().expose().as_str()),
            ("redirect_uri", config.redirect_uri()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;
    debug!(token_type = ?token.token_type, "access token received");
    Ok(token)
}

/// Fetch the signed-in user's profile with a bearer access token.
pub async fn fetch_user_info(
    client: &reqwest::Client,
    config: &OAuthConfig,
    access_token: &str,
) -> Result<UserProfile> {
    let response = client
        .get(&config.endpoints().userinfo)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| Error::Http(format!("userinfo request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::UserInfo(format!(
            "userinfo endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<UserProfile>()
        .await
        .map_err(|e| Error::UserInfo(format!("invalid userinfo response: {e}")))
}
