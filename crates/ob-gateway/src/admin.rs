//! Node/cluster self-description DTOs shared by `/v1/daemon` and
//! `/v1/health` (§6.1). Grounded on the teacher's `admin/server.rs`
//! `ServerInfo`/`HealthCheck`, trimmed from S3-feature-flag fields down to
//! the cluster facts those two endpoints actually report; there is no
//! separate `/v1/admin` surface (§6.1 names no such route).

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub daemon_id: String,
    pub role: String,
    pub is_primary: bool,
    pub smap_version: u64,
    pub bmd_version: u64,
    pub rmd_version: u64,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub is_primary: bool,
    pub joined: bool,
}
