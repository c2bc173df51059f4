//! Prometheus metrics exposition
//!
//! Exposes the counters emitted by `session-auth`:
//!
//! - `session_verifications_total` (counter): label `result`
//! - `oauth_callbacks_total` (counter): label `outcome`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use session_auth::metrics::{OAUTH_CALLBACKS_TOTAL, SESSION_VERIFICATIONS_TOTAL};

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(
        SESSION_VERIFICATIONS_TOTAL,
        "Session cookie checks by result (valid, expired, invalid, absent)"
    );
    metrics::describe_counter!(
        OAUTH_CALLBACKS_TOTAL,
        "OAuth callback completions by outcome (success, failure)"
    );
}
