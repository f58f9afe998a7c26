//! Node identity (§3 "Node (Snode)").
//!
//! A daemon id is generated once on first boot and persisted
//! (`<cfg>/proxy_id` or `<cfg>/target_id`, §6.2); every subsequent boot
//! re-validates it syntactically rather than regenerating it, mirroring
//! `cluster.genDaemonID`/daemon-id re-validation in the original source.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Random, persisted-on-first-boot node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DaemonId(String);

impl DaemonId {
    /// Generates a fresh random id in the shape the original uses: a short
    /// hex digest, not a full UUID, so it fits in HTTP headers and file
    /// names without escaping.
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Re-validates an id loaded from `<cfg>/{proxy,target}_id` on restart.
    pub fn validate(raw: &str) -> Result<Self> {
        if raw.is_empty() || raw.len() > 64 || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidArgument(format!(
                "malformed daemon id: {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DaemonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DaemonId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Node role within the cluster (§2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Proxy,
    Target,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Proxy => "proxy",
            Role::Target => "target",
        }
    }
}

/// One of a node's three network endpoints (§2: public / intra-control /
/// intra-data). Targets additionally use `data_net` for the redirect
/// destination of the data path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub hostname: String,
    pub port: u16,
}

impl NetInfo {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    pub fn url(&self, scheme: &str) -> String {
        format!("{}://{}:{}", scheme, self.hostname, self.port)
    }
}

/// A roster entry: one gateway or target, as carried in the cluster map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snode {
    pub id: DaemonId,
    pub role: Role,
    pub pub_net: NetInfo,
    pub control_net: NetInfo,
    pub data_net: NetInfo,
    /// Precomputed HRW digest input (stable hash of the id), cached so the
    /// HRW hot path never reallocates per candidate.
    pub digest: u64,
    pub flags: SnodeFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnodeFlags {
    /// Node is marked primary-candidate-ineligible (rare, operator-set).
    pub non_electable: bool,
}

impl Snode {
    pub fn new(id: DaemonId, role: Role, pub_net: NetInfo, control_net: NetInfo, data_net: NetInfo) -> Self {
        let digest = crate::utils::stable_digest(id.as_str());
        Self {
            id,
            role,
            pub_net,
            control_net,
            data_net,
            digest,
            flags: SnodeFlags::default(),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.role, Role::Proxy)
    }

    pub fn is_target(&self) -> bool {
        matches!(self.role, Role::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_id_validate_rejects_empty() {
        assert!(DaemonId::validate("").is_err());
    }

    #[test]
    fn daemon_id_validate_rejects_non_alphanumeric() {
        assert!(DaemonId::validate("abc/def").is_err());
    }

    #[test]
    fn daemon_id_validate_accepts_hex() {
        let id = DaemonId::validate("a1b2c3d4").unwrap();
        assert_eq!(id.as_str(), "a1b2c3d4");
    }

    #[test]
    fn snode_digest_is_deterministic() {
        let a = Snode::new(
            DaemonId::from("T1".to_string()),
            Role::Target,
            NetInfo::new("h", 8080),
            NetInfo::new("h", 8081),
            NetInfo::new("h", 8082),
        );
        let b = Snode::new(
            DaemonId::from("T1".to_string()),
            Role::Target,
            NetInfo::new("other-host", 1),
            NetInfo::new("other-host", 2),
            NetInfo::new("other-host", 3),
        );
        assert_eq!(a.digest, b.digest);
    }
}
