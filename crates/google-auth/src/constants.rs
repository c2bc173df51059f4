//! Google OAuth constants
//!
//! Endpoint URLs are Google's public OAuth 2.0 surface. They are defaults
//! only; `ProviderEndpoints` lets a deployment (or a test) point elsewhere.

/// Consent page the browser is redirected to
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for the authorization code exchange
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Userinfo endpoint queried with the bearer access token
pub const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested on every login.
pub const SCOPES: &str = "openid email profile";

/// Lifetime of a session token and of the cookie carrying it.
pub const SESSION_TTL_SECS: u64 = 60 * 60;

/// Signing secret file, resolved against the working directory.
pub const SECRET_FILE_NAME: &str = ".simple-google-oauth.json";

/// Callback path used when the redirect URI has no path of its own.
pub const DEFAULT_CALLBACK_PATH: &str = "/callback";
