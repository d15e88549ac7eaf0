//! Core contracts for satchel: the record model, the store handle, and the
//! persistence adapter interface.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod adapter;
pub mod record;
pub mod store;
