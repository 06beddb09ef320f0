//! Integrity checks over a [`CombatState`].
//!
//! Every check runs independently and every violation is collected, so a
//! single report describes everything wrong with a state.

use std::collections::HashSet;
use std::fmt;

use crate::state::{CombatState, ParticipantId};

/// A single broken invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    NegativeRound,
    NegativeTurn,
    TurnOutOfBounds,
    MultipleActive,
    NoActiveDuringCombat,
    NegativeInitiative(ParticipantId),
    NegativeDexterity(ParticipantId),
    DuplicateParticipants,
    StartAfterEnd,
    StartAfterPause,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeRound => f.write_str("Current round cannot be negative"),
            Self::NegativeTurn => f.write_str("Current turn cannot be negative"),
            Self::TurnOutOfBounds => f.write_str("Current turn index is out of bounds"),
            Self::MultipleActive => f.write_str("Multiple participants marked as active"),
            Self::NoActiveDuringCombat => {
                f.write_str("No participant marked as active during active combat")
            }
            Self::NegativeInitiative(id) => write!(f, "Participant {id} has negative initiative"),
            Self::NegativeDexterity(id) => write!(f, "Participant {id} has negative dexterity"),
            Self::DuplicateParticipants => {
                f.write_str("Duplicate participants found in initiative order")
            }
            Self::StartAfterEnd => f.write_str("Start time cannot be after end time"),
            Self::StartAfterPause => f.write_str("Start time cannot be after pause time"),
        }
    }
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable messages, in check order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("valid");
        }
        f.write_str(&self.messages().join("; "))
    }
}

/// Runs every invariant check against `state`.
pub fn validate(state: &CombatState) -> ValidationReport {
    let mut violations = Vec::new();

    if state.current_round < 0 {
        violations.push(Violation::NegativeRound);
    }
    if state.current_turn < 0 {
        violations.push(Violation::NegativeTurn);
    }

    let order = &state.initiative_order;
    if !order.is_empty() && usize::try_from(state.current_turn).is_ok_and(|t| t >= order.len()) {
        violations.push(Violation::TurnOutOfBounds);
    }

    let active = order.iter().filter(|entry| entry.is_active).count();
    if active > 1 {
        violations.push(Violation::MultipleActive);
    } else if active == 0 && state.is_active() && !order.is_empty() {
        violations.push(Violation::NoActiveDuringCombat);
    }

    for entry in order {
        if entry.initiative < 0 {
            violations.push(Violation::NegativeInitiative(entry.participant_id.clone()));
        }
        if entry.dexterity < 0 {
            violations.push(Violation::NegativeDexterity(entry.participant_id.clone()));
        }
    }

    let mut seen = HashSet::with_capacity(order.len());
    if !order.iter().all(|entry| seen.insert(&entry.participant_id)) {
        violations.push(Violation::DuplicateParticipants);
    }

    if let Some(started_at) = state.started_at() {
        if state.ended_at().is_some_and(|ended_at| started_at > ended_at) {
            violations.push(Violation::StartAfterEnd);
        }
        if state.paused_at().is_some_and(|paused_at| started_at > paused_at) {
            violations.push(Violation::StartAfterPause);
        }
    }

    ValidationReport { violations }
}
