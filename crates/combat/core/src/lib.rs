//! Deterministic combat rules for turn-based tabletop encounters.
//!
//! `combat-core` defines the canonical combat state, the initiative rules, the
//! integrity checks and the phase transitions. Everything here is pure: the
//! clock and the dice are passed in, and transitions report the history they
//! produced instead of writing it anywhere. The runtime crate wires these
//! pieces to storage.
pub mod config;
pub mod encounter;
pub mod error;
pub mod history;
pub mod initiative;
pub mod machine;
pub mod state;
pub mod validation;

pub use config::CombatConfig;
pub use encounter::{Encounter, EncounterStatus, Participant, ParticipantKind};
pub use error::{CombatError, ErrorSeverity, TransitionError};
pub use history::{ActionRecord, CombatAction, CombatActionLogEntry, DetailValue, Details};
pub use initiative::{
    Dice, InitiativeRoll, InitiativeRoller, ScriptedDice, dexterity_modifier, sort_order,
};
pub use machine::{SnapshotDirective, Transition, TransitionResult};
pub use state::{
    CombatPhase, CombatState, CombatantEntry, EncounterId, ParticipantId, PhaseFlagsError,
    Timestamp,
};
pub use validation::{ValidationReport, Violation, validate};
