//! The request router (§4.3): the pipeline shape shared by every handler,
//! plus bucket-init/on-the-fly discovery.

pub mod bucket_init;
pub mod pipeline;
