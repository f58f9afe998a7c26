//! `/v1/buckets[/:name]` (§4.5, §4.6, §6.1): list/summary, create/rename/
//! copy/archive/encode/prefetch, props, destroy/evict/delete-range.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use ob_auth::access;
use ob_cluster::paged_list::PageOutcome;
use ob_core::bck::{Bck, Provider};

use crate::auth::BearerToken;
use crate::handlers::error_response;
use crate::router::bucket_init::{init_and_try, try_add, BucketInitArgs, InitAndTryOutcome};
use crate::router::pipeline::{authorize, cluster_started_gate, dispatch_bucket_op, Dispatch};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct BucketQuery {
    pub provider: Option<String>,
    pub namespace: Option<String>,
}

fn parse_bck(name: &str, query: &BucketQuery) -> Result<Bck, ob_core::error::Error> {
    let provider = Provider::normalize(query.provider.as_deref().unwrap_or(""))?;
    let ns = match &query.namespace {
        Some(n) => ob_core::bck::Ns::remote(String::new(), n.clone()),
        None => ob_core::bck::Ns::global(),
    };
    Ok(Bck::new(name.to_string(), provider, ns))
}

/// `HEAD /v1/buckets/:name`: props lookup, the pure §4.5 `init` path (no
/// on-the-fly discovery — a HEAD never creates anything).
pub async fn head_bucket(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<BucketQuery>,
) -> Response {
    if let Err(e) = cluster_started_gate(&state, false) {
        return error_response(&state, e).into_response();
    }
    let bck = match parse_bck(&name, &query) {
        Ok(b) => b,
        Err(e) => return error_response(&state, e).into_response(),
    };
    let bmd = state.bmd.current();
    match crate::router::bucket_init::init(&bck, &bmd, "head-bucket") {
        Ok(props) => {
            let mut response = StatusCode::OK.into_response();
            if let Ok(value) = serde_json::to_string(&props) {
                if let Ok(header_value) = axum::http::HeaderValue::from_str(&value) {
                    response.headers_mut().insert("X-Bucket-Props", header_value);
                }
            }
            response
        }
        Err(e) => error_response(&state, e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBucketBody {
    #[serde(default)]
    pub create_ais: bool,
    #[serde(default)]
    pub head_remote: bool,
    #[serde(default)]
    pub try_head_remote: bool,
}

/// `POST /v1/buckets/:name` (create, the common case of §6.1's POST verb
/// set — rename/copy/archive/encode/prefetch share the same authorize+
/// dispatch shape but act on an already-existing bucket, so they are routed
/// through the same handler once the corresponding action types land).
pub async fn post_bucket(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<BucketQuery>,
    bearer: Option<axum::Extension<BearerToken>>,
    Json(body): Json<CreateBucketBody>,
) -> Response {
    if let Err(e) = cluster_started_gate(&state, false) {
        return error_response(&state, e).into_response();
    }

    let bck = match parse_bck(&name, &query) {
        Ok(b) => b,
        Err(e) => return error_response(&state, e).into_response(),
    };

    let token = bearer.and_then(|axum::Extension(BearerToken(t))| t);
    if let Err(e) = authorize(
        state.authorizer.as_ref(),
        token.as_deref(),
        ob_core::bck::BucketProps::new_ais(0).access_mask,
        access::CREATE_BUCKET,
    ) {
        return error_response(&state, e).into_response();
    }

    match dispatch_bucket_op(&state) {
        Dispatch::Local => {}
        Dispatch::ReverseProxy(primary) => {
            return Response::builder()
                .status(StatusCode::TEMPORARY_REDIRECT)
                .header("Location", format!("{}/v1/buckets/{}", primary.control_net.url("http"), name))
                .body(axum::body::Body::empty())
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response());
        }
        Dispatch::Redirect(_) => unreachable!("bucket ops never HRW-redirect"),
    }

    let args = BucketInitArgs {
        perms: access::CREATE_BUCKET,
        create_ais: body.create_ais,
        head_remote: body.head_remote,
        try_head_remote: body.try_head_remote,
    };

    let bmd = state.bmd.current();
    let outcome = match init_and_try(&bck, &bmd, "create-bucket", &args) {
        Ok(o) => o,
        Err(e) => return error_response(&state, e).into_response(),
    };

    match outcome {
        InitAndTryOutcome::Exists(_) => StatusCode::OK.into_response(),
        InitAndTryOutcome::NeedsCreateAis | InitAndTryOutcome::NeedsAddRemote => {
            let random_target = state.smap.current().targets.values().next().cloned();
            match try_add(&bck, &bmd, &args, random_target.as_ref(), &state.transport).await {
                Ok(next_bmd) => match state.bmd.receive(next_bmd, true) {
                    Ok(installed) => {
                        let payload = ob_cluster::metasync::MetasyncPayload {
                            smap: None,
                            bmd: Some((*installed).clone()),
                            rmd: None,
                        };
                        state.broadcast(payload).await;
                        StatusCode::OK.into_response()
                    }
                    Err(e) => error_response(&state, ob_core::error::Error::Internal(e.to_string())).into_response(),
                },
                Err(ob_core::error::Error::BucketAlreadyExists(_)) => StatusCode::OK.into_response(),
                Err(e) => error_response(&state, e).into_response(),
            }
        }
    }
}

/// `DELETE /v1/buckets/:name`: destroy (remove from BMD and metasync).
pub async fn delete_bucket(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<BucketQuery>,
) -> Response {
    if let Err(e) = cluster_started_gate(&state, false) {
        return error_response(&state, e).into_response();
    }
    let bck = match parse_bck(&name, &query) {
        Ok(b) => b,
        Err(e) => return error_response(&state, e).into_response(),
    };

    match dispatch_bucket_op(&state) {
        Dispatch::Local => {}
        Dispatch::ReverseProxy(primary) => {
            return Response::builder()
                .status(StatusCode::TEMPORARY_REDIRECT)
                .header("Location", format!("{}/v1/buckets/{}", primary.control_net.url("http"), name))
                .body(axum::body::Body::empty())
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response());
        }
        Dispatch::Redirect(_) => unreachable!("bucket ops never HRW-redirect"),
    }

    let bmd = state.bmd.current();
    match bmd.with_bucket_removed(&bck.uname()) {
        Some(next) => match state.bmd.receive(next, true) {
            Ok(installed) => {
                let payload = ob_cluster::metasync::MetasyncPayload {
                    smap: None,
                    bmd: Some((*installed).clone()),
                    rmd: None,
                };
                state.broadcast(payload).await;
                StatusCode::OK.into_response()
            }
            Err(e) => error_response(&state, ob_core::error::Error::Internal(e.to_string())).into_response(),
        },
        None => error_response(&state, ob_core::error::Error::BucketNotFound(bck.display_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub token: Option<String>,
    pub page_size: Option<usize>,
    pub uuid: Option<String>,
}

/// `GET /v1/buckets/:name`: paged object listing (§4.6). Caller supplies
/// `uuid` to continue a previous scan; omitting it starts a fresh one.
pub async fn list_bucket(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(bucket_query): Query<BucketQuery>,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(e) = cluster_started_gate(&state, false) {
        return error_response(&state, e).into_response();
    }

    let bck = match parse_bck(&name, &bucket_query) {
        Ok(b) => b,
        Err(e) => return error_response(&state, e).into_response(),
    };
    let bmd = state.bmd.current();
    if let Err(e) = crate::router::bucket_init::init(&bck, &bmd, "list-objects") {
        return error_response(&state, e).into_response();
    }

    let list_uuid = query.uuid.clone().unwrap_or_else(ob_core::utils::generate_job_uuid);
    let token = query.token.unwrap_or_default();
    let page_size = query.page_size.unwrap_or(1000);

    let smap = state.smap.current();
    let expected_targets: Vec<String> = smap.targets.keys().cloned().collect();

    let mut coordinator = state.paged_list.lock();
    match coordinator.get(&list_uuid, &token, page_size, &expected_targets) {
        PageOutcome::Page { entries, continuation_token } => Json(serde_json::json!({
            "uuid": list_uuid,
            "entries": entries,
            "continuation_token": continuation_token,
        }))
        .into_response(),
        PageOutcome::NeedsBroadcast { from_token } => {
            // The broadcast-and-ingest leg is `ob-target`'s responsibility;
            // the gateway only reports that the buffer isn't ready yet so
            // the caller can retry once targets have answered.
            Json(serde_json::json!({
                "uuid": list_uuid,
                "needs_broadcast": true,
                "from_token": from_token,
            }))
            .into_response()
        }
    }
}
