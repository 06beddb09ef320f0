//! Combat state representation.
//!
//! [`CombatState`] is owned by an encounter. The state machine receives it
//! by `&mut` and never keeps it; runtime layers clone or query it but mutate
//! it only through [`crate::machine`].
mod combatant;
mod common;
mod phase;

pub use combatant::CombatantEntry;
pub use common::{EncounterId, ParticipantId, Timestamp};
pub use phase::{CombatPhase, PhaseFlagsError};

/// Canonical combat sub-state of an encounter.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub phase: CombatPhase,

    /// One-based once combat starts; zero before the first start.
    ///
    /// Signed so that snapshots carrying negative values can be detected by
    /// validation instead of failing to decode.
    pub current_round: i32,

    /// Index into `initiative_order` of the combatant whose turn it is.
    pub current_turn: i32,

    /// Turn order; position in the vector is the order in which combatants act.
    pub initiative_order: Vec<CombatantEntry>,

    /// Duration of the finished combat in milliseconds. Set by ending combat.
    pub total_duration_ms: i64,
}

impl CombatState {
    /// Creates an inactive state with an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether turns may currently be taken.
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.phase.started_at()
    }

    pub fn paused_at(&self) -> Option<Timestamp> {
        self.phase.paused_at()
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.phase.ended_at()
    }

    /// `current_turn` as an index, if it is non-negative and in bounds.
    pub fn turn_index(&self) -> Option<usize> {
        usize::try_from(self.current_turn)
            .ok()
            .filter(|index| *index < self.initiative_order.len())
    }

    /// The entry whose turn it is, if the turn index is in bounds.
    pub fn current_entry(&self) -> Option<&CombatantEntry> {
        self.turn_index().map(|index| &self.initiative_order[index])
    }

    /// Index of the first entry flagged as holding the turn.
    pub fn active_index(&self) -> Option<usize> {
        self.initiative_order.iter().position(|entry| entry.is_active)
    }

    /// Index of the entry for `participant_id`.
    pub fn position_of(&self, participant_id: &ParticipantId) -> Option<usize> {
        self.initiative_order
            .iter()
            .position(|entry| &entry.participant_id == participant_id)
    }

    pub fn entry(&self, participant_id: &ParticipantId) -> Option<&CombatantEntry> {
        self.position_of(participant_id)
            .map(|index| &self.initiative_order[index])
    }

    /// Milliseconds since combat started, measured at `now`.
    ///
    /// Returns `None` before the first start. For ended combat this is the
    /// stored total duration.
    pub fn elapsed_ms(&self, now: Timestamp) -> Option<i64> {
        match self.phase {
            CombatPhase::Inactive => None,
            CombatPhase::Active { started_at } => Some(now.millis_since(started_at).max(0)),
            CombatPhase::Paused {
                started_at,
                paused_at,
            } => Some(paused_at.millis_since(started_at).max(0)),
            CombatPhase::Ended { .. } => Some(self.total_duration_ms),
        }
    }
}
