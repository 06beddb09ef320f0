//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and infrastructure.

pub mod errors;

pub use errors::{Result, RuntimeError};
