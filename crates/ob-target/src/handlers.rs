//! `/v1/*` handlers a target answers (§4.13, C13 "Target control
//! handlers: receives metasync, executes bucket init, forwards to
//! storage engine"). Grounded on `ob-gateway`'s handlers of the same
//! name for the parts this crate shares (metasync receive is byte-for
//! -byte the same §4.1 receive rule; `ais/target.go`'s `httpbck*`/
//! `httpobj*` family for the data-path shape), trimmed to what a target
//! actually terminates: object bodies, not redirects.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use ob_cluster::metasync::{MetasyncAck, MetasyncPayload};
use ob_core::bck::Bck;
use ob_core::error::{Error, ErrorBody};

use crate::state::TargetState;

fn error_response(state: &TargetState, err: Error) -> Response {
    if !err.is_silent_candidate() {
        tracing::warn!(error = %err, "target request failed");
    }
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody::from_error(&err, state.self_id.as_str()))).into_response()
}

/// `PUT /v1/metasync` — identical receive rule to the gateway's (§4.1);
/// a target is never primary, so the "claims primary" branch never
/// triggers here, but the rule is the same one applied by every node.
pub async fn receive_metasync(State(state): State<TargetState>, Json(payload): Json<MetasyncPayload>) -> (StatusCode, Json<MetasyncAck>) {
    let mut applied = false;
    if let Some(smap) = payload.smap {
        match state.smap.receive(smap, false) {
            Ok(_) => applied = true,
            Err(e) => tracing::debug!(error = %e, "smap receive rejected"),
        }
    }
    if let Some(bmd) = payload.bmd {
        match state.bmd.receive(bmd, false) {
            Ok(new) => {
                applied = true;
                reconcile_buckets(&state, &new);
            }
            Err(e) => tracing::debug!(error = %e, "bmd receive rejected"),
        }
    }
    if let Some(rmd) = payload.rmd {
        match state.rmd.receive(rmd, false) {
            Ok(_) => applied = true,
            Err(e) => tracing::debug!(error = %e, "rmd receive rejected"),
        }
    }
    (StatusCode::OK, Json(MetasyncAck { accepted: applied, cluster_info: None }))
}

/// §4.5/§4.13 "executes bucket init": on a new BMD, create on-disk
/// storage for any bucket not yet materialized locally. Deletions are
/// not mirrored here — a destroyed bucket's BMD entry simply disappears;
/// reclaiming its storage is the rebalance/resilver path's concern (out
/// of scope, spec.md §1).
fn reconcile_buckets(state: &TargetState, bmd: &ob_cluster::Bmd) {
    let storage = state.storage.clone();
    let unames: Vec<String> = bmd.buckets.keys().cloned().collect();
    tokio::spawn(async move {
        for uname in unames {
            match storage.bucket_exists(&uname).await {
                Ok(true) => {}
                Ok(false) => {
                    if let Err(e) = storage.create_bucket(&uname).await {
                        tracing::warn!(bucket = %uname, error = %e, "failed to materialize bucket locally");
                    }
                }
                Err(e) => tracing::warn!(bucket = %uname, error = %e, "bucket_exists check failed"),
            }
        }
    });
}

pub async fn get_object(State(state): State<TargetState>, Path((bucket, key)): Path<(String, String)>) -> Response {
    match state.storage.get(&bucket, &key).await {
        Ok(data) => data.into_response(),
        Err(e) => error_response(&state, e),
    }
}

pub async fn put_object(State(state): State<TargetState>, Path((bucket, key)): Path<(String, String)>, body: Bytes) -> Response {
    match state.storage.put(&bucket, &key, body).await {
        Ok(etag) => ([("etag", etag)], StatusCode::OK).into_response(),
        Err(e) => error_response(&state, e),
    }
}

pub async fn delete_object(State(state): State<TargetState>, Path((bucket, key)): Path<(String, String)>) -> Response {
    match state.storage.delete(&bucket, &key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&state, e),
    }
}

pub async fn head_object(State(state): State<TargetState>, Path((bucket, key)): Path<(String, String)>) -> Response {
    match state.storage.size(&bucket, &key).await {
        Ok(size) => ([("content-length", size.to_string())], StatusCode::OK).into_response(),
        Err(e) => error_response(&state, e),
    }
}

/// `POST /v1/buckets/:name` forwarded from the primary once the BMD
/// transaction commits (§4.5): a target materializes the bucket
/// directory on demand rather than only at the next metasync, so a
/// racing object PUT immediately after `CreateBucket` doesn't 404.
pub async fn create_bucket(State(state): State<TargetState>, Path(name): Path<String>) -> Response {
    let bck = match Bck::validate_name(&name) {
        Ok(()) => Bck::ais(name),
        Err(e) => return error_response(&state, e),
    };
    match state.storage.create_bucket(&bck.uname()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(&state, e),
    }
}

pub async fn delete_bucket(State(state): State<TargetState>, Path(name): Path<String>) -> Response {
    let bck = match Bck::validate_name(&name) {
        Ok(()) => Bck::ais(name),
        Err(e) => return error_response(&state, e),
    };
    match state.storage.delete_bucket(&bck.uname()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(&state, e),
    }
}

pub async fn get_daemon(State(state): State<TargetState>) -> Response {
    Json(serde_json::json!({
        "daemon_id": state.self_id.as_str(),
        "role": "target",
        "smap_version": state.smap.current().version,
        "bmd_version": state.bmd.current().version,
        "rmd_version": state.rmd.current().version,
    }))
    .into_response()
}

pub async fn health(State(_state): State<TargetState>) -> Response {
    StatusCode::OK.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ob_cluster::meta::MetaStore;
    use ob_cluster::{Bmd, Rmd, Smap};
    use ob_core::config::Config;
    use ob_core::node::{DaemonId, Role};

    use crate::storage_engine::LocalStorage;

    async fn test_state() -> TargetState {
        let dir = std::env::temp_dir().join(format!("ob-target-handlers-{}", ob_core::utils::generate_job_uuid()));
        let storage = LocalStorage::new(&dir);
        storage.init().await.unwrap();
        let self_id = DaemonId::generate();
        TargetState {
            config: Arc::new(Config::load(Role::Target, None).unwrap()),
            self_id: self_id.clone(),
            smap: Arc::new(MetaStore::new(Smap::new("U1".into(), self_id.as_str().to_string()), dir.join("smap.json"))),
            bmd: Arc::new(MetaStore::new(Bmd::new("U1".into()), dir.join("bmd.json"))),
            rmd: Arc::new(MetaStore::new(Rmd::new("U1".into()), dir.join("rmd.json"))),
            storage: Arc::new(storage),
        }
    }

    #[tokio::test]
    async fn put_get_delete_object_roundtrip() {
        let state = test_state().await;
        state.storage.create_bucket("ais/@#/b1").await.unwrap();

        let resp = put_object(State(state.clone()), Path(("ais/@#/b1".into(), "obj.txt".into())), Bytes::from_static(b"hi")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get_object(State(state.clone()), Path(("ais/@#/b1".into(), "obj.txt".into()))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = delete_object(State(state.clone()), Path(("ais/@#/b1".into(), "obj.txt".into()))).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = get_object(State(state), Path(("ais/@#/b1".into(), "obj.txt".into()))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_bucket_rejects_invalid_name() {
        let state = test_state().await;
        let resp = create_bucket(State(state), Path(".".into())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
