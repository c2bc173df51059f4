//! Cookie sessions for axum backed by Google login
//!
//! [`SessionAuth`] owns the OAuth configuration and the signing secret and
//! hands out the pieces a host router needs:
//! - [`SessionAuth::attach`] mounts the callback route and the session
//!   middleware that attaches an [`Identity`] to every request
//! - [`SessionAuth::login`] / [`SessionAuth::logout`] are method routers the
//!   host binds to whatever paths it likes
//!
//! ```rust,ignore
//! let auth = SessionAuth::new(AuthOptions::new(oauth_config))?;
//! let app = Router::new()
//!     .route("/", get(home))
//!     .route("/login", auth.login())
//!     .route("/logout", auth.logout());
//! let app = auth.attach(app);
//! ```
//!
//! Routes added to the host router after `attach` are not covered by the
//! session middleware.

mod cookies;
mod handlers;
mod identity;
pub mod metrics;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{MethodRouter, get};
use common::Secret;
use google_auth::{OAuthConfig, SessionSigner, obtain_secret, obtain_secret_in};
use tracing::info;

pub use cookies::SESSION_COOKIE_NAME;
pub use handlers::POST_LOGIN_REDIRECT;
pub use identity::{Identity, identity, identity_from_parts};

use crate::cookies::CookieSettings;
use crate::state::AuthState;

/// Everything needed to build a [`SessionAuth`].
#[derive(Debug)]
pub struct AuthOptions {
    oauth: OAuthConfig,
    jwt_secret: Option<Secret<String>>,
    secret_dir: Option<PathBuf>,
    secure_cookies: bool,
    http_client: Option<reqwest::Client>,
}

impl AuthOptions {
    pub fn new(oauth: OAuthConfig) -> Self {
        Self {
            oauth,
            jwt_secret: None,
            secret_dir: None,
            secure_cookies: false,
            http_client: None,
        }
    }

    /// Use this signing secret instead of the secret file.
    pub fn jwt_secret(mut self, secret: Secret<String>) -> Self {
        self.jwt_secret = Some(secret);
        self
    }

    /// Directory holding the secret file. Defaults to the working directory.
    pub fn secret_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secret_dir = Some(dir.into());
        self
    }

    /// Mark the session cookie `Secure`. Off by default; turn on behind HTTPS.
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// HTTP client for the token and userinfo calls.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Google login and cookie sessions for one host application.
#[derive(Clone)]
pub struct SessionAuth {
    state: AuthState,
}

impl SessionAuth {
    /// Resolve the signing secret and build the shared handler state.
    ///
    /// Fails on a malformed secret file or an unwritable secret directory.
    pub fn new(options: AuthOptions) -> google_auth::Result<Self> {
        let secret = match &options.secret_dir {
            Some(dir) => obtain_secret_in(dir, options.jwt_secret)?,
            None => obtain_secret(options.jwt_secret)?,
        };
        let signer = SessionSigner::new(&secret);

        info!(
            client_id = options.oauth.client_id(),
            callback_path = options.oauth.callback_path(),
            secure_cookies = options.secure_cookies,
            "session auth initialized"
        );

        Ok(Self {
            state: AuthState {
                cookies: CookieSettings {
                    secure: options.secure_cookies,
                    max_age_secs: signer.ttl_secs(),
                },
                signer: Arc::new(signer),
                config: Arc::new(options.oauth),
                http: options.http_client.unwrap_or_default(),
            },
        })
    }

    /// Path the callback is mounted on, taken from the redirect URI.
    pub fn callback_path(&self) -> &str {
        self.state.config.callback_path()
    }

    /// Provider consent URL, for hosts that render their own login link.
    pub fn authorization_url(&self) -> String {
        google_auth::build_authorization_url(&self.state.config)
    }

    /// Signer used for session cookies.
    pub fn signer(&self) -> &SessionSigner {
        &self.state.signer
    }

    /// Router holding only the OAuth callback route.
    pub fn routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(self.callback_path(), get(handlers::callback))
            .with_state(self.state.clone())
    }

    /// Merge the callback route into `app` and wrap every route in the
    /// session middleware.
    ///
    /// Panics if `app` already has a route at the callback path.
    pub fn attach<S>(&self, app: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        app.merge(self.routes())
            .layer(from_fn_with_state(self.state.clone(), middleware::verify_session))
    }

    /// Login initiator: redirects to the provider consent page.
    pub fn login<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        get(handlers::login).with_state(self.state.clone())
    }

    /// Logout: clears the session cookie and redirects home. GET and POST.
    pub fn logout<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        get(handlers::logout).post(handlers::logout)
    }
}
