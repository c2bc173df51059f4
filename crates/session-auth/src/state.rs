//! Handler state shared by the session middleware and the auth routes

use std::sync::Arc;

use google_auth::{OAuthConfig, SessionSigner};

use crate::cookies::CookieSettings;

/// Shared state for the callback, login and session middleware.
///
/// Built once by `SessionAuth::new` and never mutated, so handlers read it
/// concurrently without locking.
#[derive(Clone)]
pub(crate) struct AuthState {
    pub(crate) config: Arc<OAuthConfig>,
    pub(crate) signer: Arc<SessionSigner>,
    pub(crate) http: reqwest::Client,
    pub(crate) cookies: CookieSettings,
}
