//! `/v1/reverse/*path` (§4.3 step 5 "Reverse-proxy (owner/remote path)"):
//! streams the request through to the node named by the `Node-Id` header,
//! using the cached destination from [`ob_cluster::reverse_proxy`].
//!
//! Body streaming is a suspension point (§5): if the client disconnects
//! mid-stream, the forwarded request is dropped along with it rather than
//! continuing to completion, since `reqwest` tears down the outbound
//! connection when its body stream is no longer polled.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};

use ob_cluster::reverse_proxy::DestinationKey;
use ob_core::error::Error;

use crate::handlers::error_response;
use crate::state::AppState;

const NODE_ID_HEADER: &str = "Node-Id";

fn destination_for(state: &AppState, node_id: &str) -> Option<String> {
    let smap = state.smap.current();
    if !smap.proxies.contains_key(node_id) && !smap.targets.contains_key(node_id) {
        return None;
    }
    let snode = smap.proxies.get(node_id).or_else(|| smap.targets.get(node_id))?.clone();
    let dest = state
        .reverse_proxy
        .get_or_init(DestinationKey::Node(node_id.to_string()), || snode.control_net.url("http"));
    Some(dest.base_url)
}

/// Forwards `req` verbatim (method, headers, body) to the node named by
/// `Node-Id`, streaming the response back without buffering it.
pub async fn reverse_proxy(State(state): State<AppState>, req: Request) -> Response {
    let Some(node_id) = req.headers().get(NODE_ID_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string) else {
        return error_response(&state, Error::InvalidArgument(format!("missing {NODE_ID_HEADER} header"))).into_response();
    };

    let Some(base_url) = destination_for(&state, &node_id) else {
        return error_response(&state, Error::NodeNotFound(node_id)).into_response();
    };

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{base_url}{path_and_query}");

    let method = req.method().clone();
    let mut headers = req.headers().clone();
    headers.remove(NODE_ID_HEADER);
    let body_bytes = match axum::body::to_bytes(req.into_body(), usize::MAX).await {
        Ok(b) => b,
        Err(e) => return error_response(&state, Error::Internal(e.to_string())).into_response(),
    };

    let client = reqwest::Client::new();
    let reqwest_method = match reqwest::Method::from_bytes(method.as_str().as_bytes()) {
        Ok(m) => m,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let mut builder = client.request(reqwest_method, &url).body(body_bytes.to_vec());
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            builder = builder.header(name.as_str(), v);
        }
    }

    match builder.send().await {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response_headers = HeaderMap::new();
            for (name, value) in upstream.headers().iter() {
                if let (Ok(n), Ok(v)) = (
                    HeaderName::from_bytes(name.as_str().as_bytes()),
                    axum::http::HeaderValue::from_bytes(value.as_bytes()),
                ) {
                    response_headers.insert(n, v);
                }
            }
            let stream = upstream.bytes_stream();
            let mut response = Response::new(Body::from_stream(stream));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(e) => error_response(&state, Error::BadGateway(e.to_string())).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_cluster::Smap;
    use ob_core::node::DaemonId;

    #[test]
    fn destination_for_returns_none_for_unknown_node() {
        let smap = Smap::new("U1".into(), "G1".into());
        let store = ob_cluster::MetaStore::new(smap, std::env::temp_dir().join("ob-gateway-reverse-test-smap.json"));
        let state = test_state(store);
        assert!(destination_for(&state, "ghost").is_none());
    }

    fn test_state(smap: ob_cluster::MetaStore<Smap>) -> AppState {
        use parking_lot::Mutex;
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        use std::time::Instant;

        let tmp = std::env::temp_dir().join(format!("ob-gateway-reverse-test-{}", std::process::id()));
        let transport = Arc::new(ob_cluster::Transport::new(ob_cluster::TransportConfig::default()).unwrap());
        AppState {
            config: Arc::new(ob_core::config::Config::default()),
            self_id: DaemonId::from("G1".to_string()),
            self_snode: Arc::new(parking_lot::RwLock::new(None)),
            smap: Arc::new(smap),
            bmd: Arc::new(ob_cluster::MetaStore::new(ob_cluster::Bmd::new("U1".into()), tmp.join("bmd.json"))),
            rmd: Arc::new(ob_cluster::MetaStore::new(ob_cluster::Rmd::new("U1".into()), tmp.join("rmd.json"))),
            ic: Arc::new(ob_cluster::ic::InformationCenter::new(
                DaemonId::from("G1".to_string()),
                std::time::Duration::from_secs(3600),
            )),
            metasyncer: Arc::new(ob_cluster::metasync::Metasyncer::new(transport.clone())),
            transport,
            reverse_proxy: Arc::new(ob_cluster::reverse_proxy::ReverseProxyCache::new()),
            paged_list: Arc::new(Mutex::new(ob_cluster::paged_list::PagedListCoordinator::new())),
            authorizer: Arc::new(ob_auth::AllowAll),
            is_primary: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
            joined: Arc::new(AtomicBool::new(true)),
        }
    }
}
