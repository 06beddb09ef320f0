use super::ParticipantId;

/// One combatant's slot in the initiative order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CombatantEntry {
    pub participant_id: ParticipantId,
    pub initiative: i32,
    pub dexterity: i32,
    /// Whether this combatant currently holds the turn.
    pub is_active: bool,
    /// Whether this combatant has already acted in the current round.
    pub has_acted: bool,
}

impl CombatantEntry {
    /// Creates an entry that is neither acting nor has acted.
    pub fn new(participant_id: ParticipantId, initiative: i32, dexterity: i32) -> Self {
        Self {
            participant_id,
            initiative,
            dexterity,
            is_active: false,
            has_acted: false,
        }
    }

    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    #[must_use]
    pub fn with_acted(mut self, has_acted: bool) -> Self {
        self.has_acted = has_acted;
        self
    }

    /// Clears both turn flags.
    pub fn reset_flags(&mut self) {
        self.is_active = false;
        self.has_acted = false;
    }
}
