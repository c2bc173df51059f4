//! Session cookie construction and lookup

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "auth_token";

/// Attributes applied to the session cookie.
#[derive(Debug, Clone)]
pub(crate) struct CookieSettings {
    pub(crate) secure: bool,
    pub(crate) max_age_secs: u64,
}

/// Create the session cookie for a freshly signed token.
pub(crate) fn session_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(settings.max_age_secs as i64))
        .build()
}

/// Create the removal cookie for logout.
pub(crate) fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Session token from the request cookies. An empty value counts as absent.
pub(crate) fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
}
