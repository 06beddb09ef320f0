//! Encounter container consumed by the combat tracker.
//!
//! An encounter owns its participants, its combat sub-state and an
//! encounter-level [`EncounterStatus`]. The status and the combat phase are two
//! separate levels: pausing combat leaves the encounter `Active`, only the
//! phase becomes `Paused`.

use strum::{Display, EnumString, IntoStaticStr};

use crate::state::{CombatPhase, CombatState, EncounterId, ParticipantId};

/// Encounter-level status. The tracker sets `Active` on start and `Completed`
/// on end and never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncounterStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParticipantKind {
    Player,
    Npc,
    Monster,
}

/// A combatant as the encounter knows it, before it has a place in the order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub kind: ParticipantKind,
    pub dexterity: i32,
    /// Initiative entered by hand; used when combat starts without rolling.
    pub initiative: Option<i32>,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        kind: ParticipantKind,
        dexterity: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            dexterity,
            initiative: None,
        }
    }

    #[must_use]
    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }
}

/// Encounter-like container: identity, roster, status and combat state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encounter {
    pub id: EncounterId,
    pub status: EncounterStatus,
    pub participants: Vec<Participant>,
    pub combat: CombatState,
}

impl Encounter {
    /// Creates a draft encounter with no participants.
    pub fn new(id: impl Into<EncounterId>) -> Self {
        Self {
            id: id.into(),
            status: EncounterStatus::Draft,
            participants: Vec::new(),
            combat: CombatState::new(),
        }
    }

    #[must_use]
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn phase(&self) -> &CombatPhase {
        &self.combat.phase
    }
}
