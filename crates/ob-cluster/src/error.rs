//! Cluster-layer error type.

use thiserror::Error;

pub type ClusterResult<T> = Result<T, ClusterError>;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node unreachable: {0}")]
    NodeUnreachable(String),

    #[error("cluster uuid mismatch: expected {expected}, got {got}")]
    UuidMismatch { expected: String, got: String },

    #[error("downgrade: local version {local} >= incoming {incoming}")]
    Downgrade { local: u64, incoming: u64 },

    #[error("not primary")]
    NotPrimary,

    #[error("primary in transition")]
    PrimaryInTransition,

    #[error("no healthy proxies available")]
    NoHealthyNodes,

    #[error("join rejected: {0}")]
    JoinRejected(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("core error: {0}")]
    Core(#[from] ob_core::error::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClusterError {
    pub fn http_status(&self) -> u16 {
        match self {
            ClusterError::NodeNotFound(_) => 404,
            ClusterError::NotPrimary | ClusterError::PrimaryInTransition => 409,
            ClusterError::Downgrade { .. } => 409,
            ClusterError::UuidMismatch { .. } => 500,
            ClusterError::NodeUnreachable(_) | ClusterError::Transport(_) => 502,
            ClusterError::NoHealthyNodes => 503,
            ClusterError::JoinRejected(_) | ClusterError::InvalidConfig(_) => 400,
            _ => 500,
        }
    }
}
