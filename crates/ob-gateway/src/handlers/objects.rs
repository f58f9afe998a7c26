//! `/v1/objects/:bucket/*key` (§6.1): always redirects to the HRW target,
//! never returns a body on success (§8 invariant 5 "Redirect
//! conservativeness").

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use ob_core::bck::{Bck, Provider};

use crate::handlers::error_response;
use crate::router::bucket_init::init;
use crate::router::pipeline::{cluster_started_gate, dispatch_object, Dispatch};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ObjectQuery {
    pub provider: Option<String>,
    pub namespace: Option<String>,
}

/// Shared entry point for every object verb (§4.3 steps 1-5, collapsed:
/// object verbs never reverse-proxy, only redirect or 404).
pub async fn object_verb(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<ObjectQuery>,
    method: Method,
) -> Response {
    if let Err(e) = cluster_started_gate(&state, false) {
        return error_response(&state, e).into_response();
    }

    let provider = match Provider::normalize(query.provider.as_deref().unwrap_or("")) {
        Ok(p) => p,
        Err(e) => return error_response(&state, e).into_response(),
    };
    let ns = match query.namespace.clone() {
        Some(n) => ob_core::bck::Ns::remote(String::new(), n),
        None => ob_core::bck::Ns::global(),
    };
    let bck = Bck::new(bucket.clone(), provider, ns);

    let bmd = state.bmd.current();
    let action = if method == Method::DELETE { "delete-object" } else { "object-verb" };
    if let Err(e) = init(&bck, &bmd, action) {
        return error_response(&state, e).into_response();
    }

    match dispatch_object(&state, &bck, &key) {
        Ok(Dispatch::Local) => {
            // This gateway is itself the HRW target, meaning this node is
            // also running as a target. Object bodies are `ob-target`'s
            // concern; the gateway side of that split never happens here.
            error_response(&state, ob_core::error::Error::Internal("object verb reached gateway as terminal owner".into()))
                .into_response()
        }
        Ok(Dispatch::Redirect(target)) => {
            let now_nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            let mut url = format!(
                "{}/v1/objects/{}/{}?proxy-id={}&unix-time={now_nanos}",
                target.data_net.url("http"),
                bucket,
                key,
                state.self_id.as_str(),
            );
            if let Some(provider) = &query.provider {
                url.push_str(&format!("&provider={provider}"));
            }
            if let Some(namespace) = &query.namespace {
                url.push_str(&format!("&namespace={namespace}"));
            }
            let status = if method == Method::GET { StatusCode::MOVED_PERMANENTLY } else { StatusCode::TEMPORARY_REDIRECT };
            Response::builder()
                .status(status)
                .header("Location", url)
                .body(axum::body::Body::empty())
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Ok(Dispatch::ReverseProxy(_)) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(e) => error_response(&state, e).into_response(),
    }
}
