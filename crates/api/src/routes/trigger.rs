//! Trigger endpoint.
//!
//! Every request under the configured prefix, whatever its method, asks the
//! gateway to queue the script named by the rest of the path. Requests
//! outside the prefix queue nothing. The response is always `202 Accepted`
//! with no body: the caller never learns whether or when a run happens.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;

use crate::state::AppState;

/// Derive the trigger key from a request path.
///
/// Returns `None` if `path` lies outside `prefix`. The remainder is
/// percent-decoded; undecodable input is used verbatim.
pub fn trigger_key(prefix: &str, path: &str) -> Option<String> {
    let raw = path.strip_prefix(prefix)?;
    Some(match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    })
}

/// ANY <prefix>{key} -- queue a run of `key` if none is pending.
async fn trigger_script(State(state): State<AppState>, uri: Uri) -> StatusCode {
    let Some(key) = trigger_key(&state.config.trigger_prefix, uri.path()) else {
        tracing::debug!(path = uri.path(), "Trigger outside prefix ignored");
        return StatusCode::ACCEPTED;
    };

    let outcome = state.gateway.trigger(&key);
    tracing::debug!(key = %key, outcome = outcome.as_str(), "Trigger received");

    StatusCode::ACCEPTED
}

/// Mount the trigger handler as the fallback, so it sees every path.
pub fn router() -> Router<AppState> {
    Router::new().fallback(trigger_script)
}
