//! Cluster membership, versioned metadata propagation, rendezvous routing,
//! the Information Center, reverse-proxy caching, and paged-list
//! coordination — the control-plane core shared by every gateway node.
//!
//! # Components
//!
//! - [`meta`]: Smap/BMD/RMD, the generic receive-apply rule (§4.1).
//! - [`hrw`]: rendezvous hashing, the three placement use sites (§4.2).
//! - [`metasync`]: primary→all metadata broadcast (§4.1).
//! - [`keepalive`]: peer liveness and primary election (§4.7).
//! - [`ic`]: the Information Center's job ownership table (§4.4).
//! - [`reverse_proxy`]: cached reverse-proxy destinations (§3).
//! - [`paged_list`]: per-query listing buffer and merge (§4.6).
//! - [`transport`]: outbound HTTP with bounded retry.

pub mod error;
pub mod hrw;
pub mod ic;
pub mod keepalive;
pub mod meta;
pub mod metasync;
pub mod paged_list;
pub mod reverse_proxy;
pub mod transport;

pub use error::{ClusterError, ClusterResult};
pub use meta::bmd::Bmd;
pub use meta::rmd::Rmd;
pub use meta::smap::Smap;
pub use meta::{MetaStore, VersionedMeta};
pub use transport::{Transport, TransportConfig};
