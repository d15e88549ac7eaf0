//! Filesystem persistence for satchel stores: one JSON file per record,
//! named `<store id>_<key>.json` under a configurable directory, with
//! optional AES-GCM encryption at rest.
//!
//! Whole-store operations fan out one future per file and fail as a whole
//! on the first error. Calls racing on the same key settle last-write-wins;
//! this layer does no locking of its own.

pub mod adapter;
pub mod codec;
mod files;
pub mod paths;
