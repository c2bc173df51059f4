//! Request identity
//!
//! The session middleware inserts an [`Identity`] into the request
//! extensions on every request. Handlers read it back either with the
//! extractor or with [`identity`] on a raw request.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::request::Parts;
use google_auth::UserProfile;

/// The signed-in user for this request, or `None` for an anonymous one.
///
/// Never rejects: requests that did not pass through the session
/// middleware also extract as anonymous. Enforcing login is up to the
/// handler.
///
/// ```rust,ignore
/// async fn home(identity: Identity) -> String {
///     match identity.user() {
///         Some(user) => format!("Hello, {}", user.display_id()),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity(pub Option<UserProfile>);

impl Identity {
    pub fn user(&self) -> Option<&UserProfile> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn into_user(self) -> Option<UserProfile> {
        self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Profile attached to `request` by the session middleware.
pub fn identity<B>(request: &Request<B>) -> Option<&UserProfile> {
    request
        .extensions()
        .get::<Identity>()
        .and_then(Identity::user)
}

/// Same as [`identity`] for already split request parts.
pub fn identity_from_parts(parts: &Parts) -> Option<&UserProfile> {
    parts.extensions.get::<Identity>().and_then(Identity::user)
}
