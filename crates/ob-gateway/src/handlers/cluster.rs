//! `/v1/cluster` (§6.1): cluster-level control. `GET` returns the current
//! Smap; `PUT` on the primary mutates it (join/leave a node); `POST`
//! triggers an action (e.g. `start-election`); `DELETE` removes a node.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ob_cluster::keepalive::run_election;
use ob_core::node::Snode;
use serde::Deserialize;

use crate::handlers::error_response;
use crate::state::AppState;

pub async fn get_cluster(State(state): State<AppState>) -> Response {
    Json((*state.smap.current()).clone()).into_response()
}

/// Primary-only: admits a new proxy or target into the Smap and metasyncs
/// the result (§3 "join"). Non-primary gateways reverse-proxy this to the
/// primary at the router layer before it ever reaches this handler.
pub async fn put_cluster(State(state): State<AppState>, Json(node): Json<Snode>) -> Response {
    if !state.is_primary() {
        return error_response(&state, ob_core::error::Error::NotPrimary).into_response();
    }

    let mut next = (*state.smap.current()).clone();
    next.version += 1;
    if node.is_proxy() {
        next.proxies.insert(node.id.as_str().to_string(), node);
    } else {
        next.targets.insert(node.id.as_str().to_string(), node);
    }

    match state.smap.receive(next, true) {
        Ok(new_smap) => {
            state.reverse_proxy.prune_missing(&new_smap);
            let payload = ob_cluster::metasync::MetasyncPayload {
                smap: Some((*new_smap).clone()),
                bmd: None,
                rmd: None,
            };
            state.broadcast(payload).await;
            Json((*new_smap).clone()).into_response()
        }
        Err(e) => error_response(&state, ob_core::error::Error::Internal(e.to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClusterDeleteQuery {
    pub daemon_id: String,
}

pub async fn delete_cluster(State(state): State<AppState>, Query(query): Query<ClusterDeleteQuery>) -> Response {
    if !state.is_primary() {
        return error_response(&state, ob_core::error::Error::NotPrimary).into_response();
    }
    let mut next = (*state.smap.current()).clone();
    next.version += 1;
    next.proxies.remove(&query.daemon_id);
    next.targets.remove(&query.daemon_id);
    next.ic_member_ids.remove(&query.daemon_id);
    match state.smap.receive(next, true) {
        Ok(new_smap) => {
            state.reverse_proxy.prune_missing(&new_smap);
            let payload = ob_cluster::metasync::MetasyncPayload {
                smap: Some((*new_smap).clone()),
                bmd: None,
                rmd: None,
            };
            state.broadcast(payload).await;
            StatusCode::OK.into_response()
        }
        Err(e) => error_response(&state, ob_core::error::Error::Internal(e.to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClusterActionQuery {
    pub action: Option<String>,
}

/// `POST /v1/cluster?action=start-election` (§4.7): drives a two-phase
/// election and, on success, installs and broadcasts the new Smap.
pub async fn post_cluster(State(state): State<AppState>, Query(query): Query<ClusterActionQuery>) -> Response {
    if query.action.as_deref() != Some("start-election") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let current = state.smap.current();
    let bmd = state.bmd.current();
    let rmd = state.rmd.current();
    let ic_size = state.config.cluster.ic_size;

    match run_election(&state.transport, &state.self_id, &current, &bmd, &rmd, ic_size).await {
        Ok(new_smap) => match state.smap.receive(new_smap, true) {
            Ok(installed) => {
                state.is_primary.store(true, std::sync::atomic::Ordering::SeqCst);
                state.reverse_proxy.prune_missing(&installed);
                let payload = ob_cluster::metasync::MetasyncPayload {
                    smap: Some((*installed).clone()),
                    bmd: Some((*bmd).clone()),
                    rmd: Some((*rmd).clone()),
                };
                state.broadcast(payload).await;
                Json((*installed).clone()).into_response()
            }
            Err(e) => error_response(&state, ob_core::error::Error::Internal(e.to_string())).into_response(),
        },
        Err(_) => error_response(&state, ob_core::error::Error::PrimaryInTransition).into_response(),
    }
}
