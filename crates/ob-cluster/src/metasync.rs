//! Metasync: primary-only broadcaster of metadata updates to every node
//! (§4.1 "Metasync protocol"). Grounded on the teacher's replication
//! worker-pool pattern (a semaphore-bounded fan-out with per-item retry),
//! generalized from shipping object-replication events to shipping
//! metadata payloads.

use std::sync::Arc;

use ob_core::error::ClusterInfo;
use ob_core::node::Snode;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::meta::bmd::Bmd;
use crate::meta::rmd::Rmd;
use crate::meta::smap::Smap;
use crate::transport::Transport;

/// Any subset of the versioned metadata kinds (§4.1: "a payload containing
/// any subset of `{config, Smap, BMD, RMD, EtlMD, revoked-tokens}`" —
/// config/EtlMD/revoked-tokens are out of scope here, see `SPEC_FULL.md`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetasyncPayload {
    pub smap: Option<Smap>,
    pub bmd: Option<Bmd>,
    pub rmd: Option<Rmd>,
}

impl MetasyncPayload {
    pub fn is_empty(&self) -> bool {
        self.smap.is_none() && self.bmd.is_none() && self.rmd.is_none()
    }
}

/// A recipient's reply to one metasync delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetasyncAck {
    pub accepted: bool,
    /// Present when the recipient itself claims primary (§4.1: "respond
    /// with HTTP conflict and a self-description of their own cluster
    /// info").
    pub cluster_info: Option<ClusterInfo>,
}

#[derive(Debug)]
pub struct RecipientOutcome {
    pub daemon_id: String,
    pub result: Result<MetasyncAck, String>,
}

#[derive(Debug, Default)]
pub struct BroadcastResult {
    pub outcomes: Vec<RecipientOutcome>,
}

impl BroadcastResult {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// §4.1: HTTP response code is 409 only if *all* components failed.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_err())
    }

    pub fn conflicting_primaries(&self) -> Vec<&ClusterInfo> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .filter_map(|ack| ack.cluster_info.as_ref())
            .collect()
    }
}

/// Bounds how many recipients are dialed concurrently, mirroring the
/// teacher's semaphore-gated worker pool.
const MAX_CONCURRENT_SENDS: usize = 16;

pub struct Metasyncer {
    transport: Arc<Transport>,
}

impl Metasyncer {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Ships `payload` to every recipient, retrying each independently up to
    /// `max_retries` with the transport's backoff (§4.1 "Delivery is
    /// best-effort with bounded retry per recipient"). Never retried by the
    /// caller across the whole broadcast — only keepalive re-drives stale
    /// recipients later (§4.1 "Failure semantics").
    pub async fn broadcast(&self, payload: &MetasyncPayload, recipients: &[Snode]) -> BroadcastResult {
        if payload.is_empty() || recipients.is_empty() {
            return BroadcastResult::default();
        }

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SENDS));
        let mut tasks = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            let permit = semaphore.clone();
            let transport = self.transport.clone();
            let payload = payload.clone();
            let daemon_id = recipient.id.as_str().to_string();
            let url = format!("{}/v1/metasync", recipient.control_net.url("http"));

            tasks.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                let result = transport
                    .post_with_status::<MetasyncPayload, MetasyncAck>(&url, &payload)
                    .await
                    .map(|(status, ack)| {
                        if status == 409 {
                            warn!(daemon_id, "metasync recipient claims primary");
                        }
                        ack
                    })
                    .map_err(|e| e.to_string());
                RecipientOutcome { daemon_id, result }
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => error!(error = %join_err, "metasync send task panicked"),
            }
        }
        BroadcastResult { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_has_no_kinds() {
        assert!(MetasyncPayload::default().is_empty());
    }

    #[test]
    fn broadcast_result_all_failed_requires_at_least_one_outcome() {
        assert!(!BroadcastResult::default().all_failed());
    }

    #[test]
    fn broadcast_result_all_failed_true_when_every_outcome_is_err() {
        let result = BroadcastResult {
            outcomes: vec![
                RecipientOutcome {
                    daemon_id: "T1".into(),
                    result: Err("boom".into()),
                },
                RecipientOutcome {
                    daemon_id: "T2".into(),
                    result: Err("boom".into()),
                },
            ],
        };
        assert!(result.all_failed());
        assert!(!result.all_succeeded());
    }
}
