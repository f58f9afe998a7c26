//! `PUT /v1/metasync` (§4.1): receives a subset of `{Smap, BMD, RMD}` from
//! the primary and applies the §4.1 receive rule to each element present.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ob_cluster::metasync::{MetasyncAck, MetasyncPayload};

use crate::state::AppState;

pub async fn receive_metasync(
    State(state): State<AppState>,
    Json(payload): Json<MetasyncPayload>,
) -> (StatusCode, Json<MetasyncAck>) {
    if state.is_primary() {
        return (
            StatusCode::CONFLICT,
            Json(MetasyncAck {
                accepted: false,
                cluster_info: Some(state.cluster_info()),
            }),
        );
    }

    let mut applied = false;
    if let Some(smap) = payload.smap {
        match state.smap.receive(smap, false) {
            Ok(_) => {
                applied = true;
                state.reverse_proxy.prune_missing(&state.smap.current());
            }
            Err(e) => tracing::debug!(error = %e, "smap receive rejected"),
        }
    }
    if let Some(bmd) = payload.bmd {
        match state.bmd.receive(bmd, false) {
            Ok(_) => applied = true,
            Err(e) => tracing::debug!(error = %e, "bmd receive rejected"),
        }
    }
    if let Some(rmd) = payload.rmd {
        match state.rmd.receive(rmd, false) {
            Ok(_) => applied = true,
            Err(e) => tracing::debug!(error = %e, "rmd receive rejected"),
        }
    }

    (
        StatusCode::OK,
        Json(MetasyncAck {
            accepted: applied,
            cluster_info: None,
        }),
    )
}
