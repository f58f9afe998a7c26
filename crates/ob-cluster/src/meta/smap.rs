//! Cluster Map (§3 "Cluster Map (Smap)", C1).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ob_core::node::Snode;
use serde::{Deserialize, Serialize};

use super::VersionedMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smap {
    pub version: u64,
    pub uuid: String,
    pub primary_daemon_id: String,
    pub proxies: HashMap<String, Snode>,
    pub targets: HashMap<String, Snode>,
    /// Subset of `proxies` designated Information Center (§2 C1, §4.4).
    pub ic_member_ids: HashSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Smap {
    pub fn new(uuid: String, primary_daemon_id: String) -> Self {
        Self {
            version: 0,
            uuid,
            primary_daemon_id,
            proxies: HashMap::new(),
            targets: HashMap::new(),
            ic_member_ids: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// The primary is always present in the proxy map (§3 invariant).
    pub fn primary(&self) -> Option<&Snode> {
        self.proxies.get(&self.primary_daemon_id)
    }

    pub fn has_primary(&self) -> bool {
        self.primary().is_some()
    }

    /// Re-staffs IC on a primary transition (§3: "IC membership is
    /// re-staffed on every primary transition", §4.7). Picks up to
    /// `ic_size` proxies deterministically by daemon id, always including
    /// the primary.
    pub fn restaff_ic(&mut self, ic_size: usize) {
        let mut ids: Vec<&String> = self.proxies.keys().collect();
        ids.sort();
        let mut staffed: HashSet<String> = HashSet::new();
        staffed.insert(self.primary_daemon_id.clone());
        for id in ids {
            if staffed.len() >= ic_size {
                break;
            }
            if !self
                .proxies
                .get(id)
                .map(|p| p.flags.non_electable)
                .unwrap_or(true)
            {
                staffed.insert(id.clone());
            }
        }
        self.ic_member_ids = staffed;
    }
}

impl VersionedMeta for Smap {
    fn version(&self) -> u64 {
        self.version
    }
    fn uuid(&self) -> &str {
        &self.uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::node::{DaemonId, NetInfo, Role};

    fn snode(id: &str, role: Role) -> Snode {
        Snode::new(
            DaemonId::from(id.to_string()),
            role,
            NetInfo::new(id, 8080),
            NetInfo::new(id, 8081),
            NetInfo::new(id, 8082),
        )
    }

    #[test]
    fn primary_is_looked_up_in_proxy_map() {
        let mut smap = Smap::new("U1".into(), "G1".into());
        smap.proxies.insert("G1".into(), snode("G1", Role::Proxy));
        assert!(smap.has_primary());
        assert_eq!(smap.primary().unwrap().id.as_str(), "G1");
    }

    #[test]
    fn restaff_ic_always_includes_primary() {
        let mut smap = Smap::new("U1".into(), "G1".into());
        for id in ["G1", "G2", "G3", "G4"] {
            smap.proxies.insert(id.into(), snode(id, Role::Proxy));
        }
        smap.restaff_ic(3);
        assert!(smap.ic_member_ids.contains("G1"));
        assert_eq!(smap.ic_member_ids.len(), 3);
    }
}
