//! Peer liveness and primary election (§2 C5, §4.7). Grounded on the
//! teacher's heartbeat/health-check background-loop pattern, generalized
//! from peer-discovery bookkeeping to Smap-driven liveness and failover.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ob_core::node::{DaemonId, Snode};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ClusterError, ClusterResult};
use crate::meta::bmd::Bmd;
use crate::meta::rmd::Rmd;
use crate::meta::smap::Smap;
use crate::meta::MetaStore;
use crate::metasync::MetasyncPayload;
use crate::transport::Transport;

/// Tracks consecutive ping failures per peer so a single blip doesn't evict
/// a node (§2 C5 "Peer liveness").
pub struct Keepalive {
    transport: Arc<Transport>,
    max_retries: u32,
    failure_counts: RwLock<HashMap<String, u32>>,
}

impl Keepalive {
    pub fn new(transport: Arc<Transport>, max_retries: u32) -> Self {
        Self {
            transport,
            max_retries,
            failure_counts: RwLock::new(HashMap::new()),
        }
    }

    /// Pings every proxy and target in `smap` other than `self_id`; returns
    /// the daemon ids that have now exceeded `max_retries` consecutive
    /// failures (candidates for eviction from the next Smap, §3 "Snode:
    /// ... removed ... by keepalive-driven failure detection").
    pub async fn check_liveness(&self, smap: &Smap, self_id: &DaemonId) -> Vec<String> {
        let mut dead = Vec::new();
        let peers: Vec<&Snode> = smap
            .proxies
            .values()
            .chain(smap.targets.values())
            .filter(|n| n.id.as_str() != self_id.as_str())
            .collect();

        for peer in peers {
            let url = format!("{}/v1/health", peer.control_net.url("http"));
            let ok = self.transport.ping(&url).await.is_ok();
            let mut counts = self.failure_counts.write();
            if ok {
                counts.remove(peer.id.as_str());
            } else {
                let count = counts.entry(peer.id.as_str().to_string()).or_insert(0);
                *count += 1;
                if *count >= self.max_retries {
                    warn!(peer = peer.id.as_str(), "peer exceeded keepalive retry budget");
                    dead.push(peer.id.as_str().to_string());
                }
            }
        }
        dead
    }
}

/// Two-phase primary election (§4.7). `Prepare` ships the candidate's
/// current metadata for a readiness check; `Commit` installs the new Smap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotePhase {
    Prepare,
    Commit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub phase: VotePhase,
    pub candidate_id: String,
    pub payload: MetasyncPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub accepted: bool,
}

/// Runs the prepare phase against every other proxy and, if a majority
/// accept, returns the Smap the candidate should commit and metasync
/// (§4.7: "increment Smap.version by 100, promote self, re-staff IC").
/// Does not itself install or broadcast the result — the caller commits by
/// handing the returned Smap to the primary's own `MetaStore::receive` and
/// then `Metasyncer::broadcast`.
pub async fn run_election(
    transport: &Transport,
    self_id: &DaemonId,
    current: &Smap,
    bmd: &Bmd,
    rmd: &Rmd,
    ic_size: usize,
) -> ClusterResult<Smap> {
    let payload = MetasyncPayload {
        smap: Some(current.clone()),
        bmd: Some(bmd.clone()),
        rmd: Some(rmd.clone()),
    };

    let other_proxies: Vec<&Snode> = current
        .proxies
        .values()
        .filter(|p| p.id.as_str() != self_id.as_str())
        .collect();

    let mut accepted = 1; // the candidate votes for itself
    for proxy in &other_proxies {
        let url = format!("{}/v1/vote", proxy.control_net.url("http"));
        let req = VoteRequest {
            phase: VotePhase::Prepare,
            candidate_id: self_id.to_string(),
            payload: payload.clone(),
        };
        match transport.post_once::<VoteRequest, VoteResponse>(&url, &req).await {
            Ok(resp) if resp.accepted => accepted += 1,
            Ok(_) => {}
            Err(e) => warn!(peer = proxy.id.as_str(), error = %e, "vote prepare failed"),
        }
    }

    let quorum = current.proxies.len() / 2 + 1;
    if accepted < quorum {
        return Err(ClusterError::PrimaryInTransition);
    }

    let mut new_smap = current.clone();
    new_smap.version += 100;
    new_smap.primary_daemon_id = self_id.to_string();
    new_smap.restaff_ic(ic_size);
    info!(new_version = new_smap.version, "election committed, promoting self to primary");
    Ok(new_smap)
}

/// Re-attaches a recovered old primary as a non-primary member (§4.7
/// "forcefulJoin"). Fetches the current Smap from `designated_url` and
/// installs it. The `become_non_primary` → `put(newSmap)` ordering is
/// preserved non-atomic on purpose (§9 Open Question 3): an in-flight
/// metasync can race between the two steps, observing `is_primary == false`
/// against the still-stale Smap. No lock spans the network call in
/// between, matching the original's behavior rather than synthesizing an
/// atomic version it never had.
pub async fn forceful_join(
    transport: &Transport,
    designated_url: &str,
    smap_store: &MetaStore<Smap>,
    is_primary_flag: &AtomicBool,
) -> ClusterResult<Arc<Smap>> {
    is_primary_flag.store(false, Ordering::SeqCst);
    let fetched: Smap = transport
        .get(&format!("{designated_url}/v1/daemon?what=smap"))
        .await?;
    Ok(smap_store.receive(fetched, false)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_phase_roundtrips_through_serde() {
        let json = serde_json::to_string(&VotePhase::Commit).unwrap();
        let back: VotePhase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VotePhase::Commit);
    }
}
