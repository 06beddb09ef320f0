//! Per-encounter combat history.
//!
//! [`HistoryLog`] owns the clock: every record is stamped here, and stamps
//! never go backwards within one encounter even if the clock does.

use std::sync::Arc;

use combat_core::{ActionRecord, CombatActionLogEntry, EncounterId, ParticipantId};

use crate::clock::Clock;
use crate::repository::{HistoryRepository, Result};

/// Append-only action log over a [`HistoryRepository`].
#[derive(Clone)]
pub struct HistoryLog {
    repository: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
}

impl HistoryLog {
    pub fn new(repository: Arc<dyn HistoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Stamps `record` and appends it, returning the stored entry.
    pub fn append(
        &self,
        encounter_id: &EncounterId,
        record: ActionRecord,
    ) -> Result<CombatActionLogEntry> {
        let now = self.clock.now();
        let stamp = match self.repository.last(encounter_id)? {
            Some(last) => now.max(last.timestamp),
            None => now,
        };
        let entry = record.stamp(stamp);

        self.repository.append(encounter_id, &entry)?;
        tracing::trace!(
            "history[{}] += {} (round {}, turn {})",
            encounter_id,
            entry.action,
            entry.round,
            entry.turn
        );
        Ok(entry)
    }

    /// Every entry for the encounter, oldest first.
    ///
    /// Unknown encounters and unreadable logs both yield an empty list; read
    /// failures are logged.
    pub fn get_all(&self, encounter_id: &EncounterId) -> Vec<CombatActionLogEntry> {
        self.repository
            .entries(encounter_id)
            .unwrap_or_else(|err| {
                tracing::warn!("Failed to read history for {}: {}", encounter_id, err);
                Vec::new()
            })
    }

    pub fn clear(&self, encounter_id: &EncounterId) -> Result<()> {
        self.repository.clear(encounter_id)
    }

    pub fn for_round(&self, encounter_id: &EncounterId, round: i32) -> Vec<CombatActionLogEntry> {
        self.get_all(encounter_id)
            .into_iter()
            .filter(|entry| entry.round == round)
            .collect()
    }

    pub fn for_participant(
        &self,
        encounter_id: &EncounterId,
        participant_id: &ParticipantId,
    ) -> Vec<CombatActionLogEntry> {
        self.get_all(encounter_id)
            .into_iter()
            .filter(|entry| entry.participant_id.as_ref() == Some(participant_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repository::InMemoryHistoryRepository;
    use combat_core::{CombatAction, Timestamp};

    fn setup() -> (Arc<ManualClock>, HistoryLog) {
        let clock = Arc::new(ManualClock::new(Timestamp(1_000)));
        let log = HistoryLog::new(Arc::new(InMemoryHistoryRepository::new()), clock.clone());
        (clock, log)
    }

    #[test]
    fn stamps_with_the_clock() {
        let (clock, log) = setup();
        let id = EncounterId::from("e1");

        log.append(&id, ActionRecord::new(CombatAction::CombatStarted, 1, 0))
            .unwrap();
        clock.advance(500);
        let entry = log
            .append(&id, ActionRecord::new(CombatAction::TurnEnd, 1, 0))
            .unwrap();

        assert_eq!(entry.timestamp, Timestamp(1_500));
        let all = log.get_all(&id);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].timestamp, Timestamp(1_000));
        assert_eq!(all[1].action, CombatAction::TurnEnd);
    }

    #[test]
    fn stamps_never_go_backwards() {
        let (clock, log) = setup();
        let id = EncounterId::from("e1");

        log.append(&id, ActionRecord::new(CombatAction::CombatStarted, 1, 0))
            .unwrap();
        clock.advance(-400);
        let entry = log
            .append(&id, ActionRecord::new(CombatAction::TurnStart, 1, 0))
            .unwrap();

        assert_eq!(entry.timestamp, Timestamp(1_000));
    }

    #[test]
    fn encounters_are_isolated() {
        let (_clock, log) = setup();
        let a = EncounterId::from("a");
        let b = EncounterId::from("b");

        log.append(&a, ActionRecord::new(CombatAction::CombatStarted, 1, 0))
            .unwrap();
        assert!(log.get_all(&b).is_empty());

        log.clear(&a).unwrap();
        assert!(log.get_all(&a).is_empty());
    }

    #[test]
    fn filters_by_round_and_participant() {
        let (_clock, log) = setup();
        let id = EncounterId::from("e1");
        let rogue = ParticipantId::from("rogue");

        for record in [
            ActionRecord::new(CombatAction::TurnStart, 1, 0).participant(rogue.clone()),
            ActionRecord::new(CombatAction::TurnStart, 1, 1).participant("orc".into()),
            ActionRecord::new(CombatAction::RoundStart, 2, 0),
            ActionRecord::new(CombatAction::TurnStart, 2, 0).participant(rogue.clone()),
        ] {
            log.append(&id, record).unwrap();
        }

        assert_eq!(log.for_round(&id, 1).len(), 2);
        assert_eq!(log.for_round(&id, 2).len(), 2);
        let rogue_turns = log.for_participant(&id, &rogue);
        assert_eq!(rogue_turns.len(), 2);
        assert!(rogue_turns.iter().all(|e| e.action == CombatAction::TurnStart));
    }
}
