//! Target control handlers (§4.13, C13): receives metasync, executes
//! bucket-init, forwards object bodies to the storage-engine trait. The
//! storage engine itself (layout, erasure coding, mirroring, dsort, ETL,
//! checksumming) is an explicit Non-goal of spec.md §1 and is treated
//! here purely as an external-collaborator trait.

pub mod handlers;
pub mod server;
pub mod state;
pub mod storage_engine;
