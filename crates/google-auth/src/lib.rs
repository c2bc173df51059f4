//! Google OAuth login library
//!
//! Everything the browser login flow needs that is not HTTP-server plumbing:
//! provider configuration, authorization URL construction, the code-for-token
//! exchange and userinfo fetch, the signing secret file, and HS256 session
//! tokens. No dependency on axum; the `session-auth` crate wires these into
//! a router.
//!
//! Login flow:
//! 1. Host redirects the browser to `authorize::build_authorization_url()`
//! 2. Google redirects back to the callback with `?code=`
//! 3. `token::exchange_code()` trades the code for an access token
//! 4. `token::fetch_user_info()` loads the profile with that token
//! 5. `session::SessionSigner::sign()` mints the cookie value
//! 6. Every later request runs `session::SessionSigner::verify()`

pub mod authorize;
pub mod config;
pub mod constants;
pub mod error;
pub mod profile;
pub mod secret_file;
pub mod session;
pub mod token;

pub use authorize::build_authorization_url;
pub use config::{OAuthConfig, ProviderEndpoints};
pub use constants::*;
pub use error::{Error, Result};
pub use profile::UserProfile;
pub use secret_file::{obtain_secret, obtain_secret_in};
pub use session::{SessionClaims, SessionSigner};
pub use token::{TokenResponse, exchange_code, fetch_user_info};
