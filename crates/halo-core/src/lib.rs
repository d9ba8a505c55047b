//! Downloads Illustris subhalo cutouts and normalizes them into
//! self-contained snapshot files.

pub mod api;
pub mod archive;
pub mod common;
pub mod domain;
pub mod normalize;
pub mod pipeline;
pub mod store;
