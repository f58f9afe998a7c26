//! HTTP server: route table (§6.1) and process lifecycle. Grounded on the
//! teacher's `S3Server`/`create_router`, with TLS dropped (§1 Non-goals
//! don't name it, but nothing in scope exercises it, and there is no crate
//! left importing `rustls` once the old `tls.rs` is trimmed) and metrics
//! wiring dropped per §1 "Prometheus/stats wiring" Non-goal.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{any, delete, get, head, patch, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;

use ob_cluster::keepalive::Keepalive;
use ob_cluster::metasync::MetasyncPayload;

use crate::auth::extract_bearer_token;
use crate::handlers::{buckets, cluster, daemon, health, ic, metasync, objects, reverse, s3, vote};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/buckets/{name}", get(buckets::list_bucket))
        .route("/v1/buckets/{name}", post(buckets::post_bucket))
        .route("/v1/buckets/{name}", put(buckets::post_bucket))
        .route("/v1/buckets/{name}", patch(buckets::post_bucket))
        .route("/v1/buckets/{name}", head(buckets::head_bucket))
        .route("/v1/buckets/{name}", delete(buckets::delete_bucket))
        .route("/v1/objects/{bucket}/{*key}", any(objects::object_verb))
        .route("/v1/ic", get(ic::get_ic))
        .route("/v1/ic", post(ic::post_ic))
        .route("/v1/metasync", put(metasync::receive_metasync))
        .route("/v1/daemon", get(daemon::get_daemon))
        .route("/v1/daemon", put(daemon::put_daemon))
        .route("/v1/daemon", delete(daemon::delete_daemon))
        .route("/v1/cluster", get(cluster::get_cluster))
        .route("/v1/cluster", put(cluster::put_cluster))
        .route("/v1/cluster", delete(cluster::delete_cluster))
        .route("/v1/cluster", post(cluster::post_cluster))
        .route("/v1/health", get(health::health))
        .route("/v1/vote", post(vote::vote))
        .route("/v1/reverse/{*path}", any(reverse::reverse_proxy))
        .route("/s3/{bucket}", any(s3::s3_bucket))
        .route("/s3/{bucket}/{*key}", any(s3::s3_object))
        .route("/{prefix}/{bucket}", any(s3::easy_url_bucket))
        .route("/{prefix}/{bucket}/{*key}", any(s3::easy_url_object))
        .layer(axum_middleware::from_fn(extract_bearer_token))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(true)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds and serves `router` until the process is killed (§6 "gateway
/// binary"). No TLS: the teacher's `run_https` had no remaining caller
/// once TLS dropped out of scope here.
pub async fn run_http(router: Router, bind_addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "gateway listening");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await
}

/// Builds the router plus background task handles (keepalive loop, IC
/// garbage collection, reverse-proxy cache pruning) that share `state`.
pub fn spawn_background_tasks(state: Arc<AppState>) {
    let ic_gc_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            ic_gc_state.ic.gc();
        }
    });

    let prune_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            let smap = prune_state.smap.current();
            prune_state.reverse_proxy.prune_missing(&smap);
        }
    });

    spawn_keepalive(state);
}

/// Primary-only: pings every peer and, for those that exceed the retry
/// budget, evicts them from the Smap and metasyncs the result (§2 C5 "Peer
/// liveness", §3 "Snode: ... removed ... by keepalive-driven failure
/// detection producing a new Smap version"), mirroring
/// `handlers::cluster::delete_cluster`'s eviction shape.
fn spawn_keepalive(state: Arc<AppState>) {
    let keepalive = Keepalive::new(state.transport.clone(), state.config.keepalive.max_retries);
    let interval_secs = state.config.keepalive.interval_secs.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if !state.is_primary() {
                continue;
            }
            let smap = state.smap.current();
            let dead = keepalive.check_liveness(&smap, &state.self_id).await;
            if dead.is_empty() {
                continue;
            }
            let mut next = (*smap).clone();
            for id in &dead {
                next.proxies.remove(id);
                next.targets.remove(id);
                next.ic_member_ids.remove(id);
            }
            next.version += 1;
            match state.smap.receive(next, true) {
                Ok(new_smap) => {
                    tracing::warn!(?dead, "evicted unreachable peers");
                    state.reverse_proxy.prune_missing(&new_smap);
                    state
                        .broadcast(MetasyncPayload {
                            smap: Some((*new_smap).clone()),
                            bmd: None,
                            rmd: None,
                        })
                        .await;
                }
                Err(e) => tracing::debug!(error = %e, "keepalive eviction smap receive rejected"),
            }
        }
    });
}
