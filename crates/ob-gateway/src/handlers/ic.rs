//! `/v1/ic` (§4.4): `GET ?what=ic-bundle`, `POST ?what={merge-ownership,
//! listen-to-notif,reg-global-xaction}`.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use ob_cluster::ic::{IcBundle, Nl, OwnershipTable};
use serde::Deserialize;

use crate::handlers::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IcQuery {
    pub what: Option<String>,
    pub uuid: Option<String>,
    pub kind: Option<String>,
    pub bucket: Option<String>,
    #[serde(default)]
    pub only_running: bool,
}

/// `GET /v1/ic?what=ic-bundle`, or the status-query-by-uuid/filter lookup
/// (§4.4 "Answer status queries").
pub async fn get_ic(State(state): State<AppState>, Query(query): Query<IcQuery>) -> axum::response::Response {
    if query.what.as_deref() == Some("ic-bundle") {
        let smap = state.smap.current();
        let bundle = IcBundle {
            smap: (*smap).clone(),
            ownership_table: state.ic.snapshot_table(),
        };
        return Json(bundle).into_response();
    }

    if let Some(uuid) = &query.uuid {
        let smap = state.smap.current();
        if let Some(owner) = state.ic.reverse_to_owner(uuid, &smap) {
            let url = format!("{}/v1/ic?uuid={}", owner.control_net.url("http"), uuid);
            return Redirect::temporary(&url).into_response();
        }
        return match state.ic.lookup(uuid) {
            Some(nl) => Json(nl).into_response(),
            None => error_response(&state, ob_core::error::Error::TaskNotFound(uuid.clone())).into_response(),
        };
    }

    let smap = state.smap.current();
    if let Some(ic_peer) = state.ic.redirect_to_ic(&smap) {
        let url = format!("{}/v1/ic?what=status", ic_peer.control_net.url("http"));
        return Redirect::temporary(&url).into_response();
    }

    let nls = state
        .ic
        .lookup_by_filter(query.kind.as_deref(), query.bucket.as_deref(), query.only_running);
    Json(nls).into_response()
}

#[derive(Debug, Deserialize)]
pub struct IcPostQuery {
    pub what: String,
}

pub async fn post_ic(
    State(state): State<AppState>,
    Query(query): Query<IcPostQuery>,
    body: axum::body::Bytes,
) -> axum::response::Response {
    match query.what.as_str() {
        "merge-ownership" => {
            let Ok(table) = serde_json::from_slice::<OwnershipTable>(&body) else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            state.ic.apply_ownership_table(table);
            StatusCode::OK.into_response()
        }
        "listen-to-notif" => {
            let Ok(nl) = serde_json::from_slice::<Nl>(&body) else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            let mut table = state.ic.snapshot_table();
            table.entry(nl.uuid.clone()).or_insert(nl);
            state.ic.apply_ownership_table(table);
            StatusCode::OK.into_response()
        }
        "reg-global-xaction" => {
            #[derive(Deserialize)]
            struct Req {
                kind: String,
                bucket: Option<String>,
                caller_smap_version: u64,
            }
            let Ok(req) = serde_json::from_slice::<Req>(&body) else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            let smap = state.smap.current();
            let smap_for_poll = state.smap.clone();
            let nl = state
                .ic
                .register_global_xaction(
                    req.kind,
                    req.bucket,
                    req.caller_smap_version,
                    move || smap_for_poll.current().version,
                    &smap,
                    Duration::from_secs(2),
                )
                .await;
            state.ic.bcast_listen_ic(&state.transport, &nl, &smap).await;
            Json(nl).into_response()
        }
        other => (StatusCode::BAD_REQUEST, format!("unknown what={other}")).into_response(),
    }
}
