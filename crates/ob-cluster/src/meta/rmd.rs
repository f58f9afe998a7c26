//! Rebalance Metadata (§3 "Rebalance Metadata (RMD)", C3).

use serde::{Deserialize, Serialize};

use super::VersionedMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rmd {
    pub version: u64,
    pub uuid: String,
    pub resilver_uuid: Option<String>,
}

impl Rmd {
    pub fn new(uuid: String) -> Self {
        Self {
            version: 0,
            uuid,
            resilver_uuid: None,
        }
    }

    /// Bumps the rebalance counter, optionally starting a resilver
    /// alongside it (§3: "optional resilver id").
    pub fn with_rebalance_triggered(&self, resilver_uuid: Option<String>) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.resilver_uuid = resilver_uuid;
        next
    }
}

impl VersionedMeta for Rmd {
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
    fn rebalance_bumps_version() {
        let rmd = Rmd::new("U1".into());
        let next = rmd.with_rebalance_triggered(Some("resilver-1".into()));
        assert_eq!(next.version, 1);
        assert_eq!(next.resilver_uuid.as_deref(), Some("resilver-1"));
    }
}
