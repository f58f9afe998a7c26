//! Bucket Metadata (§3 "Bucket Metadata (BMD)", C2).

use std::collections::HashMap;

use ob_core::bck::BucketProps;
use serde::{Deserialize, Serialize};

use super::VersionedMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bmd {
    pub version: u64,
    /// Fixed for the cluster's lifetime (§3 invariant).
    pub uuid: String,
    /// Keyed by `Bck::uname()`.
    pub buckets: HashMap<String, BucketProps>,
    /// Monotonically assigned BID counter (§3 "BID").
    pub next_bid: u64,
}

impl Bmd {
    pub fn new(uuid: String) -> Self {
        Self {
            version: 0,
            uuid,
            buckets: HashMap::new(),
            next_bid: 1,
        }
    }

    pub fn contains(&self, uname: &str) -> bool {
        self.buckets.contains_key(uname)
    }

    pub fn get(&self, uname: &str) -> Option<&BucketProps> {
        self.buckets.get(uname)
    }

    /// Next bump of the BMD, with `uname` inserted, for the caller to
    /// `receive()` through the owning `MetaStore` (§4.5 "commits a new BMD
    /// version"). Returns `None` if the entry already exists — callers
    /// translate this into `ErrBucketAlreadyExists` (§4.5 "Concurrent
    /// duplicate creates collapse via BMD transaction").
    pub fn with_bucket_added(&self, uname: String, mut props: BucketProps) -> Option<Self> {
        if self.buckets.contains_key(&uname) {
            return None;
        }
        let mut next = self.clone();
        props.bid = next.next_bid;
        next.next_bid += 1;
        next.buckets.insert(uname, props);
        next.version += 1;
        Some(next)
    }

    pub fn with_bucket_removed(&self, uname: &str) -> Option<Self> {
        if !self.buckets.contains_key(uname) {
            return None;
        }
        let mut next = self.clone();
        next.buckets.remove(uname);
        next.version += 1;
        Some(next)
    }
}

impl VersionedMeta for Bmd {
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

    #[test]
    fn adding_existing_bucket_returns_none() {
        let bmd = Bmd::new("U1".into())
            .with_bucket_added("ais/@#/b1".into(), BucketProps::new_ais(0))
            .unwrap();
        assert!(bmd.with_bucket_added("ais/@#/b1".into(), BucketProps::new_ais(0)).is_none());
    }

    #[test]
    fn bid_is_assigned_and_monotonic() {
        let bmd = Bmd::new("U1".into());
        let bmd = bmd.with_bucket_added("ais/@#/b1".into(), BucketProps::new_ais(0)).unwrap();
        let bmd = bmd.with_bucket_added("ais/@#/b2".into(), BucketProps::new_ais(0)).unwrap();
        assert_eq!(bmd.get("ais/@#/b1").unwrap().bid, 1);
        assert_eq!(bmd.get("ais/@#/b2").unwrap().bid, 2);
        assert_eq!(bmd.version, 2);
    }
}
