//! Small helpers shared across the runtime.

pub mod hash;

pub use hash::snapshot_checksum;
