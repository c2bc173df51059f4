//! OAuth client configuration
//!
//! Built once by the host application and shared read-only by every handler.
//! The redirect URI is parsed up front so a malformed value fails at startup
//! instead of on the first login.

use common::Secret;
use url::Url;

use crate::constants::{AUTHORIZE_ENDPOINT, DEFAULT_CALLBACK_PATH, TOKEN_ENDPOINT, USERINFO_ENDPOINT};
use crate::error::{Error, Result};

/// Identity provider URLs. Defaults to Google.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            authorize: AUTHORIZE_ENDPOINT.to_string(),
            token: TOKEN_ENDPOINT.to_string(),
            userinfo: USERINFO_ENDPOINT.to_string(),
        }
    }
}

/// Client registration with the identity provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    client_id: String,
    client_secret: Secret<String>,
    redirect_uri: Url,
    endpoints: ProviderEndpoints,
}

impl OAuthConfig {
    /// Validate and build a configuration against Google's endpoints.
    ///
    /// `redirect_uri` must be an absolute http(s) URL; its path becomes the
    /// callback route.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        redirect_uri: &str,
    ) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(Error::InvalidConfig("client_id must not be empty".into()));
        }

        let redirect_uri = Url::parse(redirect_uri)
            .map_err(|e| Error::InvalidConfig(format!("redirect_uri {redirect_uri:?}: {e}")))?;
        if !matches!(redirect_uri.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "redirect_uri must use http or https, got: {}",
                redirect_uri.scheme()
            )));
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            endpoints: ProviderEndpoints::default(),
        })
    }

    /// Replace the provider endpoints.
    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &Secret<String> {
        &self.client_secret
    }

    /// Redirect URI exactly as registered with the provider.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_str()
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Path component of the redirect URI, where the callback is mounted.
    pub fn callback_path(&self) -> &str {
        match self.redirect_uri.path() {
            "" | "/" => DEFAULT_CALLBACK_PATH,
            path => path,
        }
    }
}
