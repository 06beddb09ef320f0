//! Runtime services for the combat tracker.
//!
//! This crate wires the pure rules in `combat-core` to clocks, dice and
//! storage. Consumers build a [`CombatTracker`] and drive encounters through
//! it; everything else is exposed for embedding and tests.
//!
//! Modules are organized by responsibility:
//! - [`tracker`] hosts the orchestrator and builder
//! - [`history`] and [`store`] own the action log and combat snapshots
//! - [`repository`] provides the storage backends both of them sit on
//! - [`clock`] and [`dice`] are the injected sources of time and randomness
//! - [`api`] exposes the error types downstream clients interact with
pub mod api;
pub mod clock;
pub mod config;
pub mod dice;
pub mod history;
pub mod repository;
pub mod store;
pub mod tracker;

mod utils;

pub use api::{Result, RuntimeError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use dice::RngDice;
pub use history::HistoryLog;
pub use repository::{
    FileHistoryRepository, FileSnapshotRepository, HistoryRepository, InMemoryHistoryRepository,
    InMemorySnapshotRepository, RepositoryError, SnapshotRepository,
};
pub use store::{CombatSnapshot, SnapshotError, StateStore};
pub use tracker::{CombatTracker, CombatTrackerBuilder};
