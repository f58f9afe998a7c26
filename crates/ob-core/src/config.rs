//! Node-local configuration (§6.2, §6.3), loaded the way the teacher loads
//! `HafizConfig`: TOML file via `from_file`, then an environment overlay via
//! `from_env`, every section `#[serde(default)]`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::node::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub cluster: ClusterBootstrapConfig,
    #[serde(default)]
    pub keepalive: KeepaliveConfig,
    #[serde(default)]
    pub metasync: MetasyncConfig,
    #[serde(default)]
    pub ic: IcConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            network: NetworkConfig::default(),
            cluster: ClusterBootstrapConfig::default(),
            keepalive: KeepaliveConfig::default(),
            metasync: MetasyncConfig::default(),
            ic: IcConfig::default(),
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Internal(format!("failed to read config {path}: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| Error::Internal(format!("failed to parse config {path}: {e}")))
    }

    /// Overlays the `AIS_*` environment variables named in §6.3 on top of
    /// whatever was loaded from file (or the defaults).
    pub fn from_env(mut self) -> Self {
        if let Ok(cidr) = std::env::var("AIS_CLUSTER_CIDR") {
            self.network.cluster_cidr = Some(cidr);
        }
        if let Ok(ip) = std::env::var("AIS_HOST_IP") {
            self.network.host_ip = Some(ip);
        }
        if let Ok(port) = std::env::var("AIS_HOST_PORT") {
            if let Ok(p) = port.parse() {
                self.network.host_port = Some(p);
            }
        }
        let role_var = match self.node.role {
            Role::Proxy => "AIS_PROXY_ID",
            Role::Target => "AIS_TARGET_ID",
        };
        if let Ok(id) = std::env::var(role_var) {
            self.node.daemon_id_override = Some(id);
        }
        if let Ok(level) = std::env::var("AIS_LOG_LEVEL") {
            self.logging.level = level;
        }
        self
    }

    pub fn load(role: Role, path: Option<&str>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.node.role = role;
        Ok(cfg.from_env())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub role: Role,
    /// `AIS_<ROLE>_ID` override; absent means generate-or-load-from-disk.
    pub daemon_id_override: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: Role::Proxy,
            daemon_id_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub public_port: u16,
    pub control_port: u16,
    pub data_port: u16,
    /// `AIS_CLUSTER_CIDR`: required when the node has more than one
    /// interface and the control/data networks must be disambiguated.
    pub cluster_cidr: Option<String>,
    /// `AIS_HOST_IP`/`AIS_HOST_PORT`: externally reachable data address,
    /// used by targets behind NAT so the redirect URL is dialable.
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            public_port: 51080,
            control_port: 51081,
            data_port: 51082,
            cluster_cidr: None,
            host_ip: None,
            host_port: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterBootstrapConfig {
    /// One or more known gateway URLs to join against on first boot.
    pub discovery_urls: Vec<String>,
    /// Size of the Information Center (§2 C1 invariant: "defaulting to 3
    /// when the proxy count allows").
    pub ic_size: usize,
}

impl Default for ClusterBootstrapConfig {
    fn default() -> Self {
        Self {
            discovery_urls: Vec::new(),
            ic_size: crate::DEFAULT_IC_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetasyncConfig {
    /// Per-recipient bounded retry count for a single metasync call (§4.1).
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// `CplaneOperation`-equivalent timeout (§5), used by `withRetry`.
    pub cplane_op_timeout_secs: u64,
}

impl Default for MetasyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 100,
            cplane_op_timeout_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcConfig {
    /// Age threshold past terminal state after which an NL is
    /// garbage-collected (§3 "NL lifecycle").
    pub nl_gc_age_secs: u64,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            nl_gc_age_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// `<cfg>` root (§6.2): `proxy_id`/`target_id`, `smap.json`, `bmd.json`,
    /// `rmd.json`, `.restart` all live directly under this directory.
    pub config_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/obstore"),
        }
    }
}

impl PathsConfig {
    pub fn proxy_id_file(&self) -> PathBuf {
        self.config_dir.join("proxy_id")
    }
    pub fn target_id_file(&self) -> PathBuf {
        self.config_dir.join("target_id")
    }
    pub fn smap_file(&self) -> PathBuf {
        self.config_dir.join("smap.json")
    }
    pub fn bmd_file(&self) -> PathBuf {
        self.config_dir.join("bmd.json")
    }
    pub fn rmd_file(&self) -> PathBuf {
        self.config_dir.join("rmd.json")
    }
    pub fn restart_marker(&self) -> PathBuf {
        self.config_dir.join(".restart")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_ic_size_three() {
        let cfg = Config::default();
        assert_eq!(cfg.cluster.ic_size, 3);
    }

    #[test]
    fn env_overlay_picks_role_specific_daemon_id_var() {
        std::env::set_var("AIS_PROXY_ID", "G-FIXED");
        let mut cfg = Config::default();
        cfg.node.role = Role::Proxy;
        let cfg = cfg.from_env();
        assert_eq!(cfg.node.daemon_id_override.as_deref(), Some("G-FIXED"));
        std::env::remove_var("AIS_PROXY_ID");
    }
}
