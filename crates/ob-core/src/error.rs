//! Control-plane error taxonomy (§7).
//!
//! Mirrors the teacher's error module shape: one `thiserror` enum, a
//! `.code()`/`.http_status()` pair mapping kinds onto the wire, and a small
//! JSON response body. Unlike the teacher, there is no XML variant here —
//! the S3 façade in `ob-gateway` owns translating a kind into S3 XML; this
//! crate only carries the kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("remote bucket not found: {0}")]
    RemoteBucketNotFound(String),

    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),

    #[error("bucket not empty: {0}")]
    BucketNotEmpty(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("version downgrade: local={local} incoming={incoming}")]
    VersionDowngrade { local: u64, incoming: u64 },

    #[error("not primary")]
    NotPrimary,

    #[error("primary in transition")]
    PrimaryInTransition,

    #[error("cluster not started")]
    ClusterNotStarted,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("cluster integrity violation: expected uuid {expected}, got {got}")]
    Integrity { expected: String, got: String },

    #[error("out of space on {0}")]
    OutOfSpace(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable machine-readable kind, analogous to the teacher's S3 error code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BucketNotFound(_) => "ErrBckNotFound",
            Error::RemoteBucketNotFound(_) => "ErrRemoteBckNotFound",
            Error::BucketAlreadyExists(_) => "ErrBucketAlreadyExists",
            Error::BucketNotEmpty(_) => "ErrBucketNotEmpty",
            Error::ObjectNotFound(_) => "ErrObjNotFound",
            Error::TaskNotFound(_) => "ErrTaskNotFound",
            Error::NodeNotFound(_) => "ErrNodeNotFound",
            Error::VersionDowngrade { .. } => "ErrDowngrade",
            Error::NotPrimary => "ErrNotPrimary",
            Error::PrimaryInTransition => "ErrPrimaryInTransition",
            Error::ClusterNotStarted => "ErrClusterNotStarted",
            Error::AccessDenied(_) => "ErrAccessDenied",
            Error::Unauthorized => "ErrUnauthorized",
            Error::BadGateway(_) => "ErrBadGateway",
            Error::Integrity { .. } => "ErrIntegrity",
            Error::OutOfSpace(_) => "ErrOutOfSpace",
            Error::Unsupported(_) => "ErrUnsupported",
            Error::InvalidArgument(_) => "ErrInvalidArgument",
            Error::InvalidBucketName(_) => "ErrInvalidBucketName",
            Error::Internal(_) => "ErrInternal",
            Error::Io(_) => "ErrInternal",
            Error::Json(_) => "ErrInternal",
            Error::Other(_) => "ErrInternal",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Error::BucketNotFound(_)
            | Error::RemoteBucketNotFound(_)
            | Error::ObjectNotFound(_)
            | Error::TaskNotFound(_)
            | Error::NodeNotFound(_) => 404,

            Error::BucketAlreadyExists(_)
            | Error::BucketNotEmpty(_)
            | Error::VersionDowngrade { .. }
            | Error::NotPrimary
            | Error::PrimaryInTransition => 409,

            Error::AccessDenied(_) => 403,
            Error::Unauthorized => 401,

            Error::ClusterNotStarted => 503,
            Error::BadGateway(_) => 502,

            Error::OutOfSpace(_) => 507,
            Error::Unsupported(_) => 501,

            Error::InvalidArgument(_) | Error::InvalidBucketName(_) => 400,

            // Integrity is logged-and-overridden on non-primary nodes; by the
            // time it surfaces as an HTTP error it was a hard reject on the
            // primary itself.
            Error::Integrity { .. } => 500,

            Error::Io(_) | Error::Json(_) | Error::Other(_) | Error::Internal(_) => 500,
        }
    }

    /// True for kinds the receive-rule and router treat as "silent" (§7):
    /// same status and body, but the gateway does not log them server-side.
    pub fn is_silent_candidate(&self) -> bool {
        matches!(
            self,
            Error::BucketNotFound(_) | Error::RemoteBucketNotFound(_) | Error::ObjectNotFound(_)
        )
    }
}

/// Minimal self-description a node attaches to a 409 so the sender can
/// resolve split-brain, grounded on `original_source/ais/proxy.go`'s
/// `forwardCP` cluster-info reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub smap_version: u64,
    pub bmd_version: u64,
    pub primary_id: String,
}

/// The JSON body returned for every error response (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_info: Option<ClusterInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl ErrorBody {
    pub fn from_error(err: &Error, node_id: impl Into<String>) -> Self {
        Self {
            status: err.http_status(),
            message: err.to_string(),
            cluster_info: None,
            node_id: Some(node_id.into()),
        }
    }

    pub fn with_cluster_info(mut self, info: ClusterInfo) -> Self {
        self.cluster_info = Some(info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrade_is_conflict_and_benign_candidate() {
        let err = Error::VersionDowngrade {
            local: 10,
            incoming: 9,
        };
        assert_eq!(err.http_status(), 409);
        assert_eq!(err.code(), "ErrDowngrade");
    }

    #[test]
    fn not_found_kinds_map_to_404_and_are_silenceable() {
        let err = Error::BucketNotFound("b1".into());
        assert_eq!(err.http_status(), 404);
        assert!(err.is_silent_candidate());
    }

    #[test]
    fn error_body_carries_node_id() {
        let err = Error::NotPrimary;
        let body = ErrorBody::from_error(&err, "G1");
        assert_eq!(body.status, 409);
        assert_eq!(body.node_id.as_deref(), Some("G1"));
        assert!(body.cluster_info.is_none());
    }
}
