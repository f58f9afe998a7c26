//! Target HTTP server: route table (§6.1, the subset a target answers)
//! and process lifecycle. Grounded on `ob_gateway::server`'s
//! `create_router`/`run_http` shape.

use std::net::SocketAddr;

use axum::routing::{delete, get, head, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;

use crate::handlers;
use crate::state::TargetState;

pub fn create_router(state: TargetState) -> Router {
    Router::new()
        .route("/v1/objects/{bucket}/{*key}", get(handlers::get_object))
        .route("/v1/objects/{bucket}/{*key}", put(handlers::put_object))
        .route("/v1/objects/{bucket}/{*key}", delete(handlers::delete_object))
        .route("/v1/objects/{bucket}/{*key}", head(handlers::head_object))
        .route("/v1/buckets/{name}", post(handlers::create_bucket))
        .route("/v1/buckets/{name}", delete(handlers::delete_bucket))
        .route("/v1/metasync", put(handlers::receive_metasync))
        .route("/v1/daemon", get(handlers::get_daemon))
        .route("/v1/health", get(handlers::health))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(true)))
        .with_state(state)
}

pub async fn run_http(router: Router, bind_addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "target listening");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await
}
