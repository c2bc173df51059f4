//! Google Login Demo
//!
//! Single-binary host for `session-auth`:
//! 1. Loads the Google client registration from TOML + env
//! 2. Resolves the session signing secret (env or `.simple-google-oauth.json`)
//! 3. Serves `/`, login/logout, the OAuth callback, `/health` and `/metrics`

mod config;
mod metrics;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use google_auth::OAuthConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use session_auth::{AuthOptions, Identity, SessionAuth};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    started_at: Instant,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
///
/// Everything registered before `auth.attach` sees the session middleware,
/// so `/` can read the signed-in user.
fn build_router(
    state: AppState,
    auth: &SessionAuth,
    login_path: &str,
    logout_path: &str,
    max_connections: usize,
) -> Router {
    let app = Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(login_path, auth.login())
        .route(logout_path, auth.logout());

    auth.attach(app)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// Turn the loaded config into session-auth options.
fn auth_options(config: &config::OAuthSection, http: reqwest::Client) -> Result<AuthOptions> {
    let client_secret = config
        .client_secret
        .clone()
        .context("client secret was not resolved")?;
    let oauth = OAuthConfig::new(
        config.client_id.clone(),
        client_secret,
        &config.redirect_uri,
    )
    .context("invalid oauth configuration")?;

    let mut options = AuthOptions::new(oauth)
        .secure_cookies(config.secure_cookies)
        .http_client(http);
    if let Some(secret) = &config.jwt_secret {
        options = options.jwt_secret(secret.clone());
    }
    if let Some(dir) = &config.secret_dir {
        options = options.secret_dir(dir);
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting google-login-demo");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install metrics recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        client_id = %config.oauth.client_id,
        redirect_uri = %config.oauth.redirect_uri,
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.http_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let auth = SessionAuth::new(auth_options(&config.oauth, http)?)
        .context("failed to initialize session auth")?;

    let app_state = AppState {
        started_at: Instant::now(),
        prometheus: prometheus_handle,
    };

    let app = build_router(
        app_state,
        &auth,
        &config.oauth.login_path,
        &config.oauth.logout_path,
        config.server.max_connections,
    );

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    info!(
        addr = %listen_addr,
        login = %config.oauth.login_path,
        callback = auth.callback_path(),
        "accepting requests"
    );

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Landing page: the signed-in profile, or `{"authenticated": false}`.
async fn home_handler(identity: Identity) -> impl IntoResponse {
    let body = match identity.into_user() {
        Some(user) => serde_json::json!({
            "authenticated": true,
            "user": user,
        }),
        None => serde_json::json!({ "authenticated": false }),
    };

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
