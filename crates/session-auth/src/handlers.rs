//! Login, callback and logout handlers
//!
//! The callback is the only stateful step of the flow: it trades the code
//! for an access token, loads the profile, signs a session token and sets
//! the cookie. The cookie is added only after signing succeeds, so a failed
//! callback leaves the browser anonymous.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use google_auth::{UserProfile, build_authorization_url, exchange_code, fetch_user_info};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::cookies;
use crate::metrics;
use crate::state::AuthState;

/// Where the browser lands after login and logout.
pub const POST_LOGIN_REDIRECT: &str = "/";

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Generic 500 for any callback failure. Details go to the log only.
fn oauth_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OAuth failed",
    )
        .into_response()
}

// ── Login ──────────────────────────────────────────────────────────

pub(crate) async fn login(State(state): State<AuthState>) -> Response {
    let url = build_authorization_url(&state.config);
    info!("initiating OAuth login");
    debug!(url, "redirecting to provider");
    found(&url)
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub(crate) async fn callback(
    State(state): State<AuthState>,
    params: Result<Query<CallbackParams>, QueryRejection>,
    jar: CookieJar,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "malformed callback query");
            metrics::record_callback("failure");
            return oauth_failed();
        }
    };

    if let Some(error) = &params.error {
        let description = params.error_description.as_deref().unwrap_or("<none>");
        warn!(error = %error, description, "provider returned an OAuth error");
        metrics::record_callback("failure");
        return oauth_failed();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("callback received without an authorization code");
        metrics::record_callback("failure");
        return oauth_failed();
    };

    info!("received OAuth callback");

    let (profile, token) = match complete_login(&state, &code).await {
        Ok(done) => done,
        Err(e) => {
            error!(error = %e, "OAuth flow failed");
            metrics::record_callback("failure");
            return oauth_failed();
        }
    };

    let jar = jar.add(cookies::session_cookie(token, &state.cookies));
    info!(user = %profile.display_id(), "user logged in, session cookie set");
    metrics::record_callback("success");

    (jar, found(POST_LOGIN_REDIRECT)).into_response()
}

/// Code exchange, profile fetch and signing, strictly in that order.
async fn complete_login(
    state: &AuthState,
    code: &str,
) -> google_auth::Result<(UserProfile, String)> {
    let token = exchange_code(&state.http, &state.config, code).await?;
    info!("access token received from provider");

    let profile = fetch_user_info(&state.http, &state.config, &token.access_token).await?;
    debug!(user = %profile.display_id(), "user info fetched");

    let session = state.signer.sign(&profile)?;
    Ok((profile, session))
}

// ── Logout ─────────────────────────────────────────────────────────

/// Clear the session cookie, whether or not one was set.
pub(crate) async fn logout(jar: CookieJar) -> Response {
    let had_session = cookies::session_token(&jar).is_some();
    let jar = jar.add(cookies::clear_session_cookie());
    info!(had_session, "user logged out, session cookie cleared");
    (jar, found(POST_LOGIN_REDIRECT)).into_response()
}

#[cfg(test)]
mod tests {
    use crate::{AuthOptions, Identity, SessionAuth};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::routing::{get, post};
    use common::Secret;
    use google_auth::{OAuthConfig, ProviderEndpoints};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    const SECRET: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

    /// Mock identity provider. Counts token endpoint hits.
    async fn start_mock_provider() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token_hits = Arc::new(AtomicUsize::new(0));
        let hits = token_hits.clone();

        let app = Router::new()
            .route(
                "/token",
                post(
                    move |axum::Form(form): axum::Form<HashMap<String, String>>| {
                        let hits = hits.clone();
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            if form.get("code").map(String::as_str) == Some("valid123") {
                                (
                                    StatusCode::OK,
                                    axum::Json(serde_json::json!({"access_token": "tok1"})),
                                )
                            } else {
                                (
                                    StatusCode::BAD_REQUEST,
                                    axum::Json(serde_json::json!({"error": "invalid_grant"})),
                                )
                            }
                        }
                    },
                ),
            )
            .route(
                "/userinfo",
                get(|headers: axum::http::HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer tok1") => (
                            StatusCode::OK,
                            axum::Json(serde_json::json!({"email": "a@b.com"})),
                        ),
                        _ => (StatusCode::UNAUTHORIZED, axum::Json(serde_json::json!({}))),
                    }
                }),
            )
            .route(
                "/userinfo-broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), token_hits)
    }

    fn endpoints(base: &str) -> ProviderEndpoints {
        ProviderEndpoints {
            authorize: format!("{base}/authorize"),
            token: format!("{base}/token"),
            userinfo: format!("{base}/userinfo"),
        }
    }

    fn auth_with(endpoints: ProviderEndpoints, secure: bool) -> SessionAuth {
        let config = OAuthConfig::new(
            "client-abc",
            Secret::new("secret-xyz".to_string()),
            "http://localhost:3000/auth/google/callback",
        )
        .unwrap()
        .with_endpoints(endpoints);

        SessionAuth::new(
            AuthOptions::new(config)
                .jwt_secret(Secret::new(SECRET.to_string()))
                .secure_cookies(secure),
        )
        .unwrap()
    }

    /// Host app as a consumer would build it.
    fn host_app(auth: &SessionAuth) -> Router {
        let app = Router::new()
            .route(
                "/",
                get(|identity: Identity| async move { axum::Json(identity.into_user()) }),
            )
            .route("/login", auth.login())
            .route("/logout", auth.logout());
        auth.attach(app)
    }

    async fn send(app: Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()["location"].to_str().unwrap()
    }

    fn set_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get("set-cookie")
            .map(|v| v.to_str().unwrap().to_string())
    }

    /// `auth_token` value out of a Set-Cookie header.
    fn cookie_value(set_cookie: &str) -> &str {
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("auth_token="))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn callback_success_sets_cookie_and_redirects_home() {
        let (base, _) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=valid123",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        let cookie = set_cookie(&response).expect("session cookie must be set");
        assert!(cookie.contains("HttpOnly"), "got: {cookie}");
        assert!(cookie.contains("Max-Age=3600"), "got: {cookie}");
        assert!(!cookie.contains("Secure"), "got: {cookie}");

        let profile = auth.signer().verify(cookie_value(&cookie)).unwrap();
        assert_eq!(profile.email(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn callback_cookie_authenticates_later_requests() {
        let (base, _) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=valid123",
            None,
        )
        .await;
        let cookie = set_cookie(&response).unwrap();
        let token = cookie_value(&cookie).to_string();

        let home = send(host_app(&auth), "/", Some(&format!("auth_token={token}"))).await;
        assert_eq!(home.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(home).await).unwrap();
        assert_eq!(json["email"], "a@b.com");
    }

    #[tokio::test]
    async fn secure_cookie_option_sets_secure_flag() {
        let (base, _) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), true);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=valid123",
            None,
        )
        .await;
        assert!(set_cookie(&response).unwrap().contains("Secure"));
    }

    #[tokio::test]
    async fn token_exchange_network_failure_returns_500_without_cookie() {
        let auth = auth_with(endpoints("http://127.0.0.1:1"), false);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=valid123",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie(&response).is_none());
        assert_eq!(body_text(response).await, "OAuth failed");
    }

    #[tokio::test]
    async fn rejected_code_returns_500_without_cookie() {
        let (base, hits) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(host_app(&auth), "/auth/google/callback?code=stale", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie(&response).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn userinfo_failure_returns_500_without_cookie() {
        let (base, _) = start_mock_provider().await;
        let auth = auth_with(
            ProviderEndpoints {
                userinfo: format!("{base}/userinfo-broken"),
                ..endpoints(&base)
            },
            false,
        );

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=valid123",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn provider_error_skips_token_exchange() {
        let (base, hits) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?error=access_denied",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie(&response).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_code_param_returns_500_without_cookie() {
        let (base, hits) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(
            host_app(&auth),
            "/auth/google/callback?code=a&code=b",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(set_cookie(&response).is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(body_text(response).await, "OAuth failed");
    }

    #[tokio::test]
    async fn callback_outcomes_are_counted() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let (base, _) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        send(host_app(&auth), "/auth/google/callback?code=valid123", None).await;
        send(host_app(&auth), "/auth/google/callback?code=stale", None).await;
        send(host_app(&auth), "/auth/google/callback?error=access_denied", None).await;

        let output = handle.render();
        assert!(
            output.contains("oauth_callbacks_total{outcome=\"success\"} 1"),
            "got: {output}"
        );
        assert!(
            output.contains("oauth_callbacks_total{outcome=\"failure\"} 2"),
            "got: {output}"
        );
    }

    #[tokio::test]
    async fn missing_code_returns_500() {
        let (base, hits) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(host_app(&auth), "/auth/google/callback", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_redirects_to_provider() {
        let (base, _) = start_mock_provider().await;
        let auth = auth_with(endpoints(&base), false);

        let response = send(host_app(&auth), "/login", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let target = location(&response);
        assert!(target.starts_with(&format!("{base}/authorize?")), "got: {target}");
        assert!(target.contains("client_id=client-abc"));
        assert!(target.contains("response_type=code"));
        assert!(target.contains("access_type=offline"));
        assert!(target.contains("prompt=consent"));
        assert!(set_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn logout_without_cookie_still_clears_and_redirects() {
        let auth = auth_with(endpoints("http://127.0.0.1:1"), false);

        let response = send(host_app(&auth), "/logout", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        let cookie = set_cookie(&response).expect("clearing cookie must be sent");
        assert!(cookie.starts_with("auth_token=;"), "got: {cookie}");
        assert!(cookie.contains("Max-Age=0"), "got: {cookie}");
    }

    #[tokio::test]
    async fn logout_accepts_post_and_clears_active_session() {
        let auth = auth_with(endpoints("http://127.0.0.1:1"), false);
        let token = auth
            .signer()
            .sign(&google_auth::UserProfile::new().with("email", "a@b.com"))
            .unwrap();

        let response = host_app(&auth)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header("cookie", format!("auth_token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn anonymous_home_has_no_identity() {
        let auth = auth_with(endpoints("http://127.0.0.1:1"), false);
        let response = send(host_app(&auth), "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "null");
    }
}
