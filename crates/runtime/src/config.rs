//! Tracker configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use combat_core::CombatConfig;

/// Configuration for a [`crate::CombatTracker`].
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub combat: CombatConfig,
    /// Roll initiative when combat starts instead of using preset values.
    pub auto_roll: bool,
    /// Save a snapshot after every transition while combat is in progress.
    pub persist_snapshots: bool,
    /// Directory for file-backed repositories; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Seed for deterministic dice; OS entropy when unset.
    pub dice_seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            auto_roll: true,
            persist_snapshots: true,
            data_dir: None,
            dice_seed: None,
        }
    }
}

impl TrackerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `COMBAT_AUTO_ROLL` - Roll initiative on start (default: true)
    /// - `COMBAT_PERSIST_SNAPSHOTS` - Save snapshots during combat (default: true)
    /// - `COMBAT_DATA_DIR` - Directory for file repositories (default: in-memory)
    /// - `COMBAT_DICE_SEED` - Seed for reproducible initiative rolls
    /// - `COMBAT_DEFAULT_INITIATIVE` - Initiative for participants without a preset (default: 0)
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] but reads values through `lookup`.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(auto_roll) = read_var::<bool>(&lookup, "COMBAT_AUTO_ROLL") {
            config.auto_roll = auto_roll;
        }

        if let Some(persist) = read_var::<bool>(&lookup, "COMBAT_PERSIST_SNAPSHOTS") {
            config.persist_snapshots = persist;
        }

        config.data_dir = lookup("COMBAT_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        config.dice_seed = read_var::<u64>(&lookup, "COMBAT_DICE_SEED");

        if let Some(initiative) = read_var::<i32>(&lookup, "COMBAT_DEFAULT_INITIATIVE") {
            config.combat = CombatConfig::with_default_initiative(initiative.max(0));
        }

        config
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
