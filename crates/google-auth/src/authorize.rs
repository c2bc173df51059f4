//! Authorization request construction
//!
//! The browser is sent to the provider's consent page with the client id,
//! the registered redirect URI and the requested scopes. `access_type=offline`
//! and `prompt=consent` match what Google needs to show the full consent
//! screen on every login.
//!
//! No `state` parameter is sent, so the callback cannot detect a forged
//! redirect.

use url::form_urlencoded;

use crate::config::OAuthConfig;
use crate::constants::SCOPES;

/// Build the full authorization URL for a login redirect.
pub fn build_authorization_url(config: &OAuthConfig) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", config.client_id())
        .append_pair("redirect_uri", config.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPES)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .finish();

    let endpoint = &config.endpoints().authorize;
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}
