//! Hashing utilities for persisted combat snapshots.
//!
//! Checksums are computed over the canonical JSON encoding: `serde_json`
//! maps keep their keys sorted, so equal values always hash equally no
//! matter how the source document ordered its fields.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 of `value`'s canonical JSON encoding as lowercase hex.
pub fn snapshot_checksum(value: &Value) -> String {
    hex::encode(hash_bytes(value.to_string().as_bytes()))
}

fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}
