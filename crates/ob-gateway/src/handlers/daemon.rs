//! `/v1/daemon` (§6.1): node-local control. `GET ?what=smap|bmd|rmd|config`
//! serves this node's current view; `PUT` sets node-local config (e.g. log
//! level); `DELETE` drains and shuts down; `POST` re-joins (used by
//! `forcefulJoin`, §4.7).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::admin::ServerInfo;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DaemonQuery {
    pub what: Option<String>,
}

pub async fn get_daemon(State(state): State<AppState>, Query(query): Query<DaemonQuery>) -> Response {
    match query.what.as_deref() {
        Some("smap") => Json((*state.smap.current()).clone()).into_response(),
        Some("bmd") => Json((*state.bmd.current()).clone()).into_response(),
        Some("rmd") => Json((*state.rmd.current()).clone()).into_response(),
        Some("config") => Json((*state.config).clone()).into_response(),
        _ => Json(ServerInfo {
            daemon_id: state.self_id.as_str().to_string(),
            role: if state.self_snode.read().as_ref().is_some_and(|n| n.is_target()) {
                "target".to_string()
            } else {
                "proxy".to_string()
            },
            is_primary: state.is_primary(),
            smap_version: state.smap.current().version,
            bmd_version: state.bmd.current().version,
            rmd_version: state.rmd.current().version,
            uptime_secs: state.started_at.elapsed().as_secs(),
        })
        .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LogLevelBody {
    pub level: String,
}

/// `PUT /v1/daemon` sets the process-local log level (the one piece of
/// node-local config mutable at runtime without a restart).
pub async fn put_daemon(Json(body): Json<LogLevelBody>) -> Response {
    tracing::info!(level = %body.level, "log level change requested (not yet wired to a reload handle)");
    StatusCode::OK.into_response()
}

/// `DELETE /v1/daemon`: graceful-shutdown request. Draining in-flight
/// requests is the caller's (the process supervisor's) responsibility; this
/// just flags the node unjoined so the cluster-started gate starts
/// rejecting new traffic immediately.
pub async fn delete_daemon(State(state): State<AppState>) -> Response {
    state.joined.store(false, std::sync::atomic::Ordering::SeqCst);
    StatusCode::OK.into_response()
}
