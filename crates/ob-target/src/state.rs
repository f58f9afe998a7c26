//! Target-local state, mirroring `ob_gateway::state::AppState`'s shape but
//! trimmed to what a target actually owns: no IC, no metasyncer (targets
//! never originate metasync), no reverse-proxy cache, no paged-list
//! coordinator (the gateway owns the merge, §4.6) — a target only holds
//! its view of the versioned metadata plus the storage-engine handle.

use std::sync::Arc;

use ob_cluster::meta::MetaStore;
use ob_cluster::{Bmd, Rmd, Smap};
use ob_core::config::Config;
use ob_core::node::DaemonId;

use crate::storage_engine::StorageEngine;

#[derive(Clone)]
pub struct TargetState {
    pub config: Arc<Config>,
    pub self_id: DaemonId,
    pub smap: Arc<MetaStore<Smap>>,
    pub bmd: Arc<MetaStore<Bmd>>,
    pub rmd: Arc<MetaStore<Rmd>>,
    pub storage: Arc<dyn StorageEngine>,
}

impl TargetState {
    pub fn is_primary(&self) -> bool {
        self.smap
            .current()
            .primary()
            .is_some_and(|p| p.id == self.self_id)
    }
}
