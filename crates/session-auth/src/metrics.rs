//! Login and session counters
//!
//! Emitted through the `metrics` facade; they are no-ops until the host
//! installs a recorder (the demo service installs the Prometheus one).
//!
//! - `session_verifications_total` (counter): label `result`
//!   (`valid`, `expired`, `invalid`, `absent`)
//! - `oauth_callbacks_total` (counter): label `outcome` (`success`, `failure`)

pub const SESSION_VERIFICATIONS_TOTAL: &str = "session_verifications_total";
pub const OAUTH_CALLBACKS_TOTAL: &str = "oauth_callbacks_total";

pub(crate) fn record_verification(result: &'static str) {
    metrics::counter!(SESSION_VERIFICATIONS_TOTAL, "result" => result).increment(1);
}

pub(crate) fn record_callback(outcome: &'static str) {
    metrics::counter!(OAUTH_CALLBACKS_TOTAL, "outcome" => outcome).increment(1);
}
