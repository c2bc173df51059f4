//! Session verification middleware
//!
//! Runs before every route of the host router. Reads the `auth_token`
//! cookie, verifies it against the signing secret, and attaches an
//! [`Identity`] to the request. It only annotates: bad, expired or missing
//! tokens become an anonymous identity and the request continues.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use google_auth::{Error as AuthError, UserProfile};
use tracing::{debug, info, warn};

use crate::cookies;
use crate::identity::Identity;
use crate::metrics;
use crate::state::AuthState;

pub(crate) async fn verify_session(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let profile = {
        let jar = CookieJar::from_headers(request.headers());
        resolve_identity(&state, cookies::session_token(&jar))
    };

    request.extensions_mut().insert(Identity(profile));
    next.run(request).await
}

/// Map a raw cookie value to a profile. Every failure is absorbed here.
fn resolve_identity(state: &AuthState, token: Option<&str>) -> Option<UserProfile> {
    let Some(token) = token else {
        metrics::record_verification("absent");
        return None;
    };

    match state.signer.verify(token) {
        Ok(profile) => {
            debug!(user = %profile.display_id(), "session verified");
            metrics::record_verification("valid");
            Some(profile)
        }
        Err(AuthError::SessionExpired) => {
            info!("session token expired, treating request as anonymous");
            metrics::record_verification("expired");
            None
        }
        Err(e) => {
            warn!(error = %e, "invalid session token, treating request as anonymous");
            metrics::record_verification("invalid");
            None
        }
    }
}
