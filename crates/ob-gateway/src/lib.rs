//! Gateway: the request router, bucket-init, IC/metasync endpoints, S3
//! facade, and the process wiring that ties them to an [`ob_cluster`]
//! control plane (§4.3, §6.1).

pub mod admin;
pub mod auth;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
