//! Shared application state (§5 "Global singletons" turned into a
//! threaded context value per §9's design note rather than a process-wide
//! mutable singleton).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ob_cluster::ic::InformationCenter;
use ob_cluster::meta::{MetaStore, VersionedMeta};
use ob_cluster::metasync::{MetasyncPayload, Metasyncer};
use ob_cluster::paged_list::PagedListCoordinator;
use ob_cluster::reverse_proxy::ReverseProxyCache;
use ob_cluster::{Bmd, Rmd, Smap, Transport};
use ob_core::config::Config;
use ob_core::node::{DaemonId, Snode};
use ob_auth::Authorizer;
use parking_lot::Mutex;

/// Per-gateway node state, cloned (cheaply, via `Arc`s) into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub self_id: DaemonId,
    pub self_snode: Arc<parking_lot::RwLock<Option<Snode>>>,
    pub smap: Arc<MetaStore<Smap>>,
    pub bmd: Arc<MetaStore<Bmd>>,
    pub rmd: Arc<MetaStore<Rmd>>,
    pub ic: Arc<InformationCenter>,
    pub metasyncer: Arc<Metasyncer>,
    pub transport: Arc<Transport>,
    pub reverse_proxy: Arc<ReverseProxyCache>,
    pub paged_list: Arc<Mutex<PagedListCoordinator>>,
    pub authorizer: Arc<dyn Authorizer>,
    pub is_primary: Arc<AtomicBool>,
    pub started_at: Instant,
    /// Set once this node has self-joined the cluster (§4.3 step 1 "Cluster
    /// -started gate").
    pub joined: Arc<AtomicBool>,
}

impl AppState {
    pub fn is_primary(&self) -> bool {
        self.is_primary.load(Ordering::SeqCst)
    }

    pub fn is_cluster_started(&self) -> bool {
        self.joined.load(Ordering::SeqCst) && self.smap.current().has_primary()
    }

    pub fn cluster_info(&self) -> ob_core::error::ClusterInfo {
        let smap = self.smap.current();
        ob_core::error::ClusterInfo {
            smap_version: smap.version(),
            bmd_version: self.bmd.current().version(),
            primary_id: smap.primary_daemon_id.clone(),
        }
    }

    /// Broadcasts whatever subset of metadata changed to every node other
    /// than self (§4.1 "Metasync protocol").
    pub async fn broadcast(&self, payload: MetasyncPayload) {
        let smap = self.smap.current();
        let recipients: Vec<Snode> = smap
            .proxies
            .values()
            .chain(smap.targets.values())
            .filter(|n| n.id.as_str() != self.self_id.as_str())
            .cloned()
            .collect();
        let outcome = self.metasyncer.broadcast(&payload, &recipients).await;
        if outcome.all_failed() {
            tracing::warn!("metasync broadcast failed for every recipient");
        }
    }
}
