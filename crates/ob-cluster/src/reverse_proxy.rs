//! Reverse-proxy destination cache (§3 "Reverse-proxy cache", §9 "Reverse-
//! proxy caches" design note). Owns only the cached destination metadata —
//! streaming the actual HTTP body through is `ob-gateway`'s concern; this
//! crate models the lock-free-ish lookup and the Smap-driven eviction rule.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;

use crate::meta::smap::Smap;

/// §9: "a single sharded map from `DestinationKey = Primary | Node(NodeId)
/// | RemoteAIS(Uuid)`".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DestinationKey {
    Primary,
    Node(String),
    RemoteAis(String),
}

#[derive(Debug, Clone)]
pub struct CachedDestination {
    pub base_url: String,
}

const SHARD_COUNT: usize = 16;

/// Sharded map so that a write to one destination's entry never blocks a
/// read of an unrelated one (§5 "The reverse-proxy node map is a lock-free
/// concurrent map; writers only add on first use or URL change").
pub struct ReverseProxyCache {
    shards: Vec<RwLock<HashMap<DestinationKey, CachedDestination>>>,
}

impl Default for ReverseProxyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseProxyCache {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, key: &DestinationKey) -> &RwLock<HashMap<DestinationKey, CachedDestination>> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    pub fn get(&self, key: &DestinationKey) -> Option<CachedDestination> {
        self.shard_for(key).read().get(key).cloned()
    }

    /// Builds the destination on first use only; repeat lookups for the
    /// same key hit the cache without re-resolving a URL.
    pub fn get_or_init(&self, key: DestinationKey, base_url: impl FnOnce() -> String) -> CachedDestination {
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        let shard = self.shard_for(&key);
        let mut guard = shard.write();
        guard
            .entry(key)
            .or_insert_with(|| CachedDestination { base_url: base_url() })
            .clone()
    }

    pub fn evict(&self, key: &DestinationKey) {
        self.shard_for(key).write().remove(key);
    }

    /// Prunes `Node(id)` entries whose node has left the Smap (§3
    /// "Evicted when the node leaves the Smap").
    pub fn prune_missing(&self, smap: &Smap) {
        for shard in &self.shards {
            shard.write().retain(|key, _| match key {
                DestinationKey::Node(id) => smap.proxies.contains_key(id) || smap.targets.contains_key(id),
                _ => true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_init_only_builds_once() {
        let cache = ReverseProxyCache::new();
        let mut calls = 0;
        let key = DestinationKey::Node("T1".into());
        let first = cache.get_or_init(key.clone(), || {
            calls += 1;
            "http://t1".to_string()
        });
        let second = cache.get_or_init(key, || {
            calls += 1;
            "http://t1-other".to_string()
        });
        assert_eq!(first.base_url, second.base_url);
        assert_eq!(calls, 1);
    }

    #[test]
    fn prune_missing_evicts_departed_nodes() {
        let cache = ReverseProxyCache::new();
        cache.get_or_init(DestinationKey::Node("T1".into()), || "http://t1".into());
        cache.get_or_init(DestinationKey::Primary, || "http://primary".into());

        let smap = Smap::new("U1".into(), "G1".into());
        cache.prune_missing(&smap);

        assert!(cache.get(&DestinationKey::Node("T1".into())).is_none());
        assert!(cache.get(&DestinationKey::Primary).is_some());
    }
}
