//! Combat tracker orchestration.
//!
//! [`CombatTracker`] drives the pure transitions in [`combat_core::machine`]
//! against an [`Encounter`], then stamps and appends the resulting records
//! through [`HistoryLog`] and saves or clears the snapshot through
//! [`StateStore`]. Every operation returns `true` if it applied and `false`
//! if it was refused; a refused operation changes nothing.

use std::sync::Arc;

use combat_core::machine;
use combat_core::{
    CombatActionLogEntry, CombatError, CombatState, Dice, Encounter, EncounterId,
    EncounterStatus, InitiativeRoller, Participant, ParticipantId, SnapshotDirective,
    Transition, TransitionResult, ValidationReport, validate,
};

use crate::api::{Result, RuntimeError};
use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::dice::RngDice;
use crate::history::HistoryLog;
use crate::repository::{
    FileHistoryRepository, FileSnapshotRepository, HistoryRepository, InMemoryHistoryRepository,
    InMemorySnapshotRepository, SnapshotRepository,
};
use crate::store::StateStore;

type BoxedDice = Box<dyn Dice + Send>;

/// Orchestrates combat on encounters.
///
/// Design: the tracker owns the collaborators (dice, clock, history, store)
/// but never the encounter. Callers hold encounters and lend them per call.
pub struct CombatTracker {
    config: TrackerConfig,
    roller: InitiativeRoller<BoxedDice>,
    clock: Arc<dyn Clock>,
    history: HistoryLog,
    store: StateStore,
}

impl CombatTracker {
    /// Create a new tracker builder
    pub fn builder() -> CombatTrackerBuilder {
        CombatTrackerBuilder::new()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn history_log(&self) -> &HistoryLog {
        &self.history
    }

    pub fn state_store(&self) -> &StateStore {
        &self.store
    }

    /// Start (or restart) combat from the encounter's roster.
    ///
    /// Any earlier history for the encounter is discarded first.
    pub fn start_combat(&mut self, encounter: &mut Encounter, auto_roll: bool) -> bool {
        let now = self.clock.now();
        let result = machine::start_combat(
            &mut encounter.combat,
            &encounter.participants,
            auto_roll,
            &mut self.roller,
            &self.config.combat,
            now,
        );
        if result.is_ok() {
            if let Err(err) = self.history.clear(&encounter.id) {
                tracing::warn!("Failed to clear history for {}: {}", encounter.id, err);
            }
            encounter.status = EncounterStatus::Active;
            tracing::info!(
                "Combat started in {} with {} combatants",
                encounter.id,
                encounter.combat.initiative_order.len()
            );
        }
        self.apply(encounter, "start_combat", result)
    }

    /// Pause active combat. The encounter itself stays `Active`.
    pub fn pause_combat(&mut self, encounter: &mut Encounter) -> bool {
        let result = machine::pause_combat(&mut encounter.combat, self.clock.now());
        self.apply(encounter, "pause_combat", result)
    }

    pub fn resume_combat(&mut self, encounter: &mut Encounter) -> bool {
        let result = machine::resume_combat(&mut encounter.combat, self.clock.now());
        self.apply(encounter, "resume_combat", result)
    }

    /// End combat and mark the encounter completed.
    pub fn end_combat(&mut self, encounter: &mut Encounter) -> bool {
        let result = machine::end_combat(&mut encounter.combat, self.clock.now());
        if result.is_ok() {
            encounter.status = EncounterStatus::Completed;
            tracing::info!(
                "Combat ended in {} after {} rounds ({} ms)",
                encounter.id,
                encounter.combat.current_round,
                encounter.combat.total_duration_ms
            );
        }
        self.apply(encounter, "end_combat", result)
    }

    pub fn next_turn(&mut self, encounter: &mut Encounter) -> bool {
        let result = machine::next_turn(&mut encounter.combat);
        self.apply(encounter, "next_turn", result)
    }

    pub fn previous_turn(&mut self, encounter: &mut Encounter) -> bool {
        let result = machine::previous_turn(&mut encounter.combat);
        self.apply(encounter, "previous_turn", result)
    }

    pub fn set_initiative(
        &mut self,
        encounter: &mut Encounter,
        participant_id: &ParticipantId,
        initiative: i32,
        dexterity: i32,
    ) -> bool {
        let result =
            machine::set_initiative(&mut encounter.combat, participant_id, initiative, dexterity);
        self.apply(encounter, "set_initiative", result)
    }

    /// Reroll one combatant, or everyone with `None`.
    pub fn reroll_initiative(
        &mut self,
        encounter: &mut Encounter,
        participant_id: Option<&ParticipantId>,
    ) -> bool {
        let result =
            machine::reroll_initiative(&mut encounter.combat, participant_id, &mut self.roller);
        self.apply(encounter, "reroll_initiative", result)
    }

    /// Bring a new participant into the roster and the initiative order.
    pub fn add_combatant(
        &mut self,
        encounter: &mut Encounter,
        participant: Participant,
        auto_roll: bool,
    ) -> bool {
        let result = machine::add_combatant(
            &mut encounter.combat,
            &participant,
            auto_roll,
            &mut self.roller,
            &self.config.combat,
        );
        if result.is_ok() && encounter.participant(&participant.id).is_none() {
            encounter.participants.push(participant);
        }
        self.apply(encounter, "add_combatant", result)
    }

    /// Remove a participant from the initiative order and the roster.
    pub fn remove_combatant(
        &mut self,
        encounter: &mut Encounter,
        participant_id: &ParticipantId,
    ) -> bool {
        let result = machine::remove_combatant(&mut encounter.combat, participant_id);
        if result.is_ok() {
            encounter.participants.retain(|p| &p.id != participant_id);
        }
        self.apply(encounter, "remove_combatant", result)
    }

    /// Replace the encounter's combat state with its stored snapshot.
    pub fn restore(&self, encounter: &mut Encounter) -> bool {
        if !self.store.load(&encounter.id, &mut encounter.combat) {
            return false;
        }
        if encounter.combat.phase.in_progress() {
            encounter.status = EncounterStatus::Active;
        }
        tracing::info!(
            "Restored {} at round {}, turn {}",
            encounter.id,
            encounter.combat.current_round,
            encounter.combat.current_turn
        );
        true
    }

    /// The stored snapshot for an encounter without applying it.
    pub fn stored_snapshot(&self, encounter_id: &EncounterId) -> Result<Option<CombatState>> {
        Ok(self.store.try_load(encounter_id)?)
    }

    pub fn validate(&self, encounter: &Encounter) -> ValidationReport {
        validate(&encounter.combat)
    }

    pub fn history(&self, encounter_id: &EncounterId) -> Vec<CombatActionLogEntry> {
        self.history.get_all(encounter_id)
    }

    pub fn clear_history(&self, encounter_id: &EncounterId) -> bool {
        match self.history.clear(encounter_id) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Failed to clear history for {}: {}", encounter_id, err);
                false
            }
        }
    }

    fn apply(&self, encounter: &Encounter, operation: &str, result: TransitionResult) -> bool {
        match result {
            Ok(transition) => {
                self.commit(&encounter.id, &encounter.combat, transition);
                true
            }
            Err(err) if err.severity().is_internal() => {
                tracing::warn!(
                    "{} on {} failed [{}]: {}",
                    operation,
                    encounter.id,
                    err.error_code(),
                    err
                );
                false
            }
            Err(err) => {
                tracing::debug!(
                    "{} on {} refused [{}]: {}",
                    operation,
                    encounter.id,
                    err.error_code(),
                    err
                );
                false
            }
        }
    }

    fn commit(&self, encounter_id: &EncounterId, state: &CombatState, transition: Transition) {
        for record in transition.records {
            if let Err(err) = self.history.append(encounter_id, record) {
                tracing::warn!("Failed to append history for {}: {}", encounter_id, err);
            }
        }

        match transition.snapshot {
            SnapshotDirective::Keep => {}
            SnapshotDirective::Save => {
                if self.config.persist_snapshots {
                    self.store.save(encounter_id, state);
                }
            }
            SnapshotDirective::Clear => self.store.clear(encounter_id),
        }
    }
}

/// Builder for [`CombatTracker`].
///
/// Anything not provided falls back to the configuration: file repositories
/// under `data_dir` (in-memory without one), the system clock, and dice
/// seeded from `dice_seed` (OS entropy without one).
pub struct CombatTrackerBuilder {
    config: TrackerConfig,
    history_repository: Option<Arc<dyn HistoryRepository>>,
    snapshot_repository: Option<Arc<dyn SnapshotRepository>>,
    clock: Option<Arc<dyn Clock>>,
    dice: Option<BoxedDice>,
}

impl CombatTrackerBuilder {
    fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            history_repository: None,
            snapshot_repository: None,
            clock: None,
            dice: None,
        }
    }

    /// Override tracker configuration
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history_repository(mut self, repository: Arc<dyn HistoryRepository>) -> Self {
        self.history_repository = Some(repository);
        self
    }

    pub fn snapshot_repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshot_repository = Some(repository);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn dice(mut self, dice: impl Dice + Send + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    /// Build the tracker
    pub fn build(self) -> Result<CombatTracker> {
        let (history_repository, snapshot_repository) = match &self.config.data_dir {
            Some(dir) => {
                let data_dir_error = |source| RuntimeError::DataDir {
                    path: dir.clone(),
                    source,
                };
                let history: Arc<dyn HistoryRepository> = match self.history_repository {
                    Some(repository) => repository,
                    None => Arc::new(FileHistoryRepository::new(dir).map_err(data_dir_error)?),
                };
                let snapshots: Arc<dyn SnapshotRepository> = match self.snapshot_repository {
                    Some(repository) => repository,
                    None => Arc::new(FileSnapshotRepository::new(dir).map_err(data_dir_error)?),
                };
                tracing::info!("Using file repositories under {}", dir.display());
                (history, snapshots)
            }
            None => {
                let history: Arc<dyn HistoryRepository> = match self.history_repository {
                    Some(repository) => repository,
                    None => Arc::new(InMemoryHistoryRepository::new()),
                };
                let snapshots: Arc<dyn SnapshotRepository> = match self.snapshot_repository {
                    Some(repository) => repository,
                    None => Arc::new(InMemorySnapshotRepository::new()),
                };
                (history, snapshots)
            }
        };

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let dice: BoxedDice = match (self.dice, self.config.dice_seed) {
            (Some(dice), _) => dice,
            (None, Some(seed)) => Box::new(RngDice::seeded(seed)),
            (None, None) => Box::new(RngDice::from_entropy()),
        };

        Ok(CombatTracker {
            roller: InitiativeRoller::new(dice),
            history: HistoryLog::new(history_repository, clock.clone()),
            store: StateStore::new(snapshot_repository),
            clock,
            config: self.config,
        })
    }
}
