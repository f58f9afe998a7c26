//! `GET /v1/health` (§6.1): `?pr=true` asks primary readiness, `?cii=true`
//! returns cluster-info. Plain GET is the keepalive ping target
//! ([`ob_cluster::keepalive`]).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::admin::HealthCheck;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct HealthQuery {
    #[serde(default)]
    pub pr: bool,
    #[serde(default)]
    pub cii: bool,
}

pub async fn health(State(state): State<AppState>, Query(query): Query<HealthQuery>) -> impl axum::response::IntoResponse {
    if query.pr && !state.is_primary() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({"primary_ready": false})));
    }
    if query.cii {
        return (StatusCode::OK, Json(serde_json::to_value(state.cluster_info()).unwrap_or_default()));
    }
    (
        StatusCode::OK,
        Json(serde_json::to_value(HealthCheck {
            status: "ok".to_string(),
            is_primary: state.is_primary(),
            joined: state.joined.load(std::sync::atomic::Ordering::SeqCst),
        })
        .unwrap_or_default()),
    )
}
