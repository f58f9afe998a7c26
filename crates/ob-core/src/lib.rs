//! Core types, traits, and utilities shared by every node role.
//!
//! Bucket/namespace identity, node identity, the error taxonomy, and
//! node-local configuration all live here because both the gateway and
//! the target crates need them without depending on each other.

pub mod bck;
pub mod config;
pub mod error;
pub mod node;
pub mod retry;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};

/// Build version, surfaced on `/v1/daemon?what=smap` and similar status endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum bucket name length.
pub const MAX_BUCKET_NAME_LENGTH: usize = 63;

/// Minimum bucket name length.
pub const MIN_BUCKET_NAME_LENGTH: usize = 3;

/// `withRetry`-style control-plane poll interval (see `retry`).
pub const RETRY_POLL_INTERVAL_MS: u64 = 100;

/// Default IC (Information Center) size when the proxy count allows it.
pub const DEFAULT_IC_SIZE: usize = 3;
