//! HTTP handlers, one module per `/v1/*` surface named in §6.1.

pub mod buckets;
pub mod cluster;
pub mod daemon;
pub mod health;
pub mod ic;
pub mod metasync;
pub mod objects;
pub mod reverse;
pub mod s3;
pub mod vote;

use axum::http::StatusCode;
use axum::Json;
use ob_core::error::{Error, ErrorBody};

use crate::state::AppState;

/// Shared error-to-response mapping (§7 "every error response carries a
/// machine-readable status code ... JSON body"). Not-found/remote-not-found
/// kinds skip the warn log per `Error::is_silent_candidate` (§7 "silent
/// errors log nothing on the gateway").
pub fn error_response(state: &AppState, err: Error) -> (StatusCode, Json<ErrorBody>) {
    if !err.is_silent_candidate() {
        tracing::warn!(error = %err, "request failed");
    }
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody::from_error(&err, state.self_id.as_str());
    let body = if matches!(status.as_u16(), 409 | 500) {
        body.with_cluster_info(state.cluster_info())
    } else {
        body
    };
    (status, Json(body))
}
