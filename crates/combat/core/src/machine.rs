//! Combat phase transitions.
//!
//! Each operation takes the state explicitly, mutates it in place, and returns
//! a [`Transition`] describing the history records to append and what to do
//! with the persisted snapshot. A refused operation returns a
//! [`TransitionError`] and leaves the state untouched.
//!
//! ```text
//! Inactive ──start──▶ Active ◀──resume── Paused
//!                       │  └────pause────▶ │
//!                       └──end──▶ Ended ◀──┘
//! ```

use crate::config::CombatConfig;
use crate::encounter::Participant;
use crate::error::TransitionError;
use crate::history::{ActionRecord, CombatAction};
use crate::initiative::{Dice, InitiativeRoller, sort_order};
use crate::state::{CombatPhase, CombatState, CombatantEntry, ParticipantId, Timestamp};

/// What the runtime should do with the stored snapshot after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotDirective {
    /// Leave any stored snapshot as it is.
    Keep,
    /// Persist the new state.
    Save,
    /// Delete the stored snapshot.
    Clear,
}

/// Result of an applied transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub records: Vec<ActionRecord>,
    pub snapshot: SnapshotDirective,
}

impl Transition {
    /// Saves while combat is in progress, keeps otherwise.
    fn for_state(state: &CombatState, records: Vec<ActionRecord>) -> Self {
        let snapshot = if state.phase.in_progress() {
            SnapshotDirective::Save
        } else {
            SnapshotDirective::Keep
        };
        Self { records, snapshot }
    }
}

pub type TransitionResult = Result<Transition, TransitionError>;

/// Starts (or restarts) combat with a fresh initiative order.
///
/// With `auto_roll`, every participant rolls `d20 + dexterity modifier`;
/// otherwise each uses its preset initiative or `config.default_initiative`.
/// The first combatant in the sorted order takes the first turn of round 1.
pub fn start_combat<D: Dice>(
    state: &mut CombatState,
    participants: &[Participant],
    auto_roll: bool,
    roller: &mut InitiativeRoller<D>,
    config: &CombatConfig,
    now: Timestamp,
) -> TransitionResult {
    for (index, participant) in participants.iter().enumerate() {
        if participants[..index].iter().any(|p| p.id == participant.id) {
            return Err(TransitionError::DuplicateParticipant(participant.id.clone()));
        }
    }

    let mut order = if auto_roll {
        roller.bulk_roll(participants)
    } else {
        let mut order: Vec<CombatantEntry> = participants
            .iter()
            .map(|p| {
                let initiative = p.initiative.unwrap_or(config.default_initiative);
                CombatantEntry::new(p.id.clone(), initiative, p.dexterity)
            })
            .collect();
        sort_order(&mut order);
        order
    };
    if let Some(first) = order.first_mut() {
        first.is_active = true;
    }

    state.phase = CombatPhase::Active { started_at: now };
    state.current_round = CombatConfig::FIRST_ROUND;
    state.current_turn = 0;
    state.initiative_order = order;
    state.total_duration_ms = 0;

    let record = ActionRecord::new(CombatAction::CombatStarted, state.current_round, 0)
        .detail("autoRollInitiative", auto_roll)
        .detail("participantCount", participants.len());
    Ok(Transition::for_state(state, vec![record]))
}

/// Suspends active combat. The encounter-level status is not touched.
pub fn pause_combat(state: &mut CombatState, now: Timestamp) -> TransitionResult {
    let CombatPhase::Active { started_at } = state.phase else {
        return Err(TransitionError::NotActive);
    };
    state.phase = CombatPhase::Paused {
        started_at,
        paused_at: now,
    };

    let record = ActionRecord::new(
        CombatAction::CombatPaused,
        state.current_round,
        state.current_turn,
    );
    Ok(Transition::for_state(state, vec![record]))
}

/// Resumes paused combat, clearing the pause stamp.
pub fn resume_combat(state: &mut CombatState, now: Timestamp) -> TransitionResult {
    let CombatPhase::Paused {
        started_at,
        paused_at,
    } = state.phase
    else {
        return Err(TransitionError::NotPaused);
    };
    state.phase = CombatPhase::Active { started_at };

    let record = ActionRecord::new(
        CombatAction::CombatResumed,
        state.current_round,
        state.current_turn,
    )
    .detail("pausedMs", now.millis_since(paused_at).max(0));
    Ok(Transition::for_state(state, vec![record]))
}

/// Ends combat and records its duration.
///
/// Duration is `ended_at - started_at`, minus `paused_at - started_at` when a
/// pause stamp is still present, floored at zero. Every combatant's turn flags
/// are cleared and the stored snapshot is dropped.
pub fn end_combat(state: &mut CombatState, now: Timestamp) -> TransitionResult {
    let started_at = state.started_at();
    let paused_at = state.paused_at();

    let total_duration = started_at.map_or(0, |started_at| {
        let paused_offset = paused_at.map_or(0, |paused_at| paused_at.millis_since(started_at));
        (now.millis_since(started_at) - paused_offset).max(0)
    });

    state.phase = CombatPhase::Ended {
        started_at,
        paused_at,
        ended_at: now,
    };
    state.total_duration_ms = total_duration;
    for entry in &mut state.initiative_order {
        entry.reset_flags();
    }

    let record = ActionRecord::new(
        CombatAction::CombatEnded,
        state.current_round,
        state.current_turn,
    )
    .detail("totalRounds", state.current_round)
    .detail("totalDuration", total_duration);
    Ok(Transition {
        records: vec![record],
        snapshot: SnapshotDirective::Clear,
    })
}

/// Checks that turns can move and returns the current turn index.
fn turn_guard(state: &CombatState) -> Result<usize, TransitionError> {
    if !state.is_active() {
        return Err(TransitionError::NotActive);
    }
    if state.initiative_order.is_empty() {
        return Err(TransitionError::EmptyOrder);
    }
    state
        .turn_index()
        .ok_or(TransitionError::TurnOutOfBounds {
            turn: state.current_turn,
            len: state.initiative_order.len(),
        })
}

/// Round number after the current one. Checked before anything is mutated.
fn following_round(state: &CombatState) -> Result<i32, TransitionError> {
    state
        .current_round
        .checked_add(1)
        .ok_or(TransitionError::RoundOverflow {
            round: state.current_round,
        })
}

/// Moves to `next_round`: turn 0, everyone may act again.
fn begin_next_round(
    state: &mut CombatState,
    next_round: i32,
    from_turn: i32,
    records: &mut Vec<ActionRecord>,
) {
    let finished = state.current_round;
    state.current_round = next_round;
    state.current_turn = 0;
    for entry in &mut state.initiative_order {
        entry.has_acted = false;
    }
    records.push(ActionRecord::new(CombatAction::RoundEnd, finished, from_turn));
    records.push(ActionRecord::new(
        CombatAction::RoundStart,
        state.current_round,
        0,
    ));
}

/// Hands the turn to the entry at `current_turn` and records it.
fn begin_turn(state: &mut CombatState, records: &mut Vec<ActionRecord>) {
    let Some(index) = state.turn_index() else {
        return;
    };
    let entry = &mut state.initiative_order[index];
    entry.is_active = true;
    records.push(
        ActionRecord::new(
            CombatAction::TurnStart,
            state.current_round,
            state.current_turn,
        )
        .participant(entry.participant_id.clone()),
    );
}

/// Ends the current combatant's turn and starts the next one, wrapping into a
/// new round after the last combatant.
pub fn next_turn(state: &mut CombatState) -> TransitionResult {
    let index = turn_guard(state)?;
    let next_round = if index + 1 >= state.initiative_order.len() {
        Some(following_round(state)?)
    } else {
        None
    };
    let mut records = Vec::with_capacity(4);

    let finished_turn = state.current_turn;
    let current = &mut state.initiative_order[index];
    current.has_acted = true;
    current.is_active = false;
    records.push(
        ActionRecord::new(CombatAction::TurnEnd, state.current_round, finished_turn)
            .participant(current.participant_id.clone()),
    );

    match next_round {
        Some(round) => begin_next_round(state, round, finished_turn, &mut records),
        None => state.current_turn += 1,
    }
    begin_turn(state, &mut records);

    Ok(Transition::for_state(state, records))
}

/// Steps back to the previous combatant, wrapping to the end of the previous
/// round. The round never drops below 1.
pub fn previous_turn(state: &mut CombatState) -> TransitionResult {
    let index = turn_guard(state)?;
    let mut records = Vec::with_capacity(2);

    state.initiative_order[index].is_active = false;

    let target = if index == 0 {
        let last = state.initiative_order.len() - 1;
        let previous_round = state
            .current_round
            .saturating_sub(1)
            .max(CombatConfig::FIRST_ROUND);
        if previous_round != state.current_round {
            state.current_round = previous_round;
            records.push(
                ActionRecord::new(
                    CombatAction::RoundStart,
                    previous_round,
                    i32::try_from(last).unwrap_or(i32::MAX),
                )
                .detail("reverted", true),
            );
        }
        last
    } else {
        index - 1
    };
    state.current_turn = i32::try_from(target).unwrap_or(i32::MAX);

    let entry = &mut state.initiative_order[target];
    entry.is_active = true;
    entry.has_acted = false;
    records.push(
        ActionRecord::new(
            CombatAction::TurnStart,
            state.current_round,
            state.current_turn,
        )
        .participant(entry.participant_id.clone())
        .detail("reverted", true),
    );

    Ok(Transition::for_state(state, records))
}

/// Re-sorts the order and points `current_turn` back at the acting entry.
fn resort_tracking_active(state: &mut CombatState) {
    let acting = state
        .active_index()
        .map(|index| state.initiative_order[index].participant_id.clone());
    sort_order(&mut state.initiative_order);
    if let Some(index) = acting.and_then(|id| state.position_of(&id)) {
        state.current_turn = i32::try_from(index).unwrap_or(i32::MAX);
    }
}

/// Overwrites a combatant's initiative and dexterity, then re-sorts.
pub fn set_initiative(
    state: &mut CombatState,
    participant_id: &ParticipantId,
    initiative: i32,
    dexterity: i32,
) -> TransitionResult {
    let index = state
        .position_of(participant_id)
        .ok_or_else(|| TransitionError::ParticipantNotFound(participant_id.clone()))?;

    let entry = &mut state.initiative_order[index];
    entry.initiative = initiative;
    entry.dexterity = dexterity;
    resort_tracking_active(state);

    let record = ActionRecord::new(
        CombatAction::InitiativeSet,
        state.current_round,
        state.current_turn,
    )
    .participant(participant_id.clone())
    .detail("initiative", initiative)
    .detail("dexterity", dexterity);
    Ok(Transition::for_state(state, vec![record]))
}

/// Rerolls one combatant (or everyone with `None`) and re-sorts.
pub fn reroll_initiative<D: Dice>(
    state: &mut CombatState,
    participant_id: Option<&ParticipantId>,
    roller: &mut InitiativeRoller<D>,
) -> TransitionResult {
    if let Some(id) = participant_id
        && state.position_of(id).is_none()
    {
        return Err(TransitionError::ParticipantNotFound(id.clone()));
    }

    let acting = state
        .active_index()
        .map(|index| state.initiative_order[index].participant_id.clone());
    roller.reroll(&mut state.initiative_order, participant_id);
    if let Some(index) = acting.and_then(|id| state.position_of(&id)) {
        state.current_turn = i32::try_from(index).unwrap_or(i32::MAX);
    }

    let mut record = ActionRecord::new(
        CombatAction::InitiativeRerolled,
        state.current_round,
        state.current_turn,
    );
    match participant_id {
        Some(id) => {
            let initiative = state.entry(id).map_or(0, |entry| entry.initiative);
            record = record
                .participant(id.clone())
                .detail("scope", "single")
                .detail("initiative", initiative);
        }
        None => record = record.detail("scope", "all"),
    }
    Ok(Transition::for_state(state, vec![record]))
}

/// Adds a combatant mid-combat, keeping the acting combatant's turn.
pub fn add_combatant<D: Dice>(
    state: &mut CombatState,
    participant: &Participant,
    auto_roll: bool,
    roller: &mut InitiativeRoller<D>,
    config: &CombatConfig,
) -> TransitionResult {
    if state.position_of(&participant.id).is_some() {
        return Err(TransitionError::DuplicateParticipant(participant.id.clone()));
    }

    let initiative = if auto_roll {
        roller.roll_with_modifier(participant.dexterity).total
    } else {
        participant.initiative.unwrap_or(config.default_initiative)
    };
    state.initiative_order.push(CombatantEntry::new(
        participant.id.clone(),
        initiative,
        participant.dexterity,
    ));
    resort_tracking_active(state);

    let mut records = vec![
        ActionRecord::new(
            CombatAction::ParticipantAdded,
            state.current_round,
            state.current_turn,
        )
        .participant(participant.id.clone())
        .detail("initiative", initiative),
    ];

    // Combat that started with nobody in it gets its first acting combatant.
    if state.is_active() && state.active_index().is_none() {
        if state.turn_index().is_none() {
            state.current_turn = 0;
        }
        begin_turn(state, &mut records);
    }

    Ok(Transition::for_state(state, records))
}

/// Removes a combatant from the order.
///
/// If the removed combatant held the turn, the turn passes to whoever slides
/// into its slot, wrapping into a new round if it was last.
pub fn remove_combatant(state: &mut CombatState, participant_id: &ParticipantId) -> TransitionResult {
    let index = state
        .position_of(participant_id)
        .ok_or_else(|| TransitionError::ParticipantNotFound(participant_id.clone()))?;

    let last = state.initiative_order.len() - 1;
    let wraps = index == last && last > 0 && state.initiative_order[index].is_active;
    let next_round = if wraps {
        Some(following_round(state)?)
    } else {
        None
    };

    let removed = state.initiative_order.remove(index);
    let mut records = vec![
        ActionRecord::new(
            CombatAction::ParticipantRemoved,
            state.current_round,
            state.current_turn,
        )
        .participant(removed.participant_id.clone()),
    ];

    let len = state.initiative_order.len();
    if len == 0 {
        state.current_turn = 0;
    } else if removed.is_active {
        if let Some(round) = next_round {
            let from_turn = state.current_turn;
            begin_next_round(state, round, from_turn, &mut records);
        } else {
            state.current_turn = i32::try_from(index).unwrap_or(i32::MAX);
        }
        begin_turn(state, &mut records);
    } else if let Some(active) = state.active_index() {
        state.current_turn = i32::try_from(active).unwrap_or(i32::MAX);
    } else {
        let turn = usize::try_from(state.current_turn).unwrap_or(0);
        let shifted = if index < turn { turn - 1 } else { turn };
        state.current_turn = i32::try_from(shifted.min(len - 1)).unwrap_or(i32::MAX);
    }

    Ok(Transition::for_state(state, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::ParticipantKind;
    use crate::error::CombatError;
    use crate::history::DetailValue;
    use crate::initiative::ScriptedDice;
    use crate::validation::validate;
    use proptest::prelude::*;

    const T0: Timestamp = Timestamp(10_000);

    fn party() -> Vec<Participant> {
        vec![
            Participant::new("fighter", "Fighter", ParticipantKind::Player, 14),
            Participant::new("rogue", "Rogue", ParticipantKind::Player, 18),
            Participant::new("orc", "Orc", ParticipantKind::Monster, 12),
        ]
    }

    fn started() -> CombatState {
        let mut state = CombatState::new();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(10));
        start_combat(
            &mut state,
            &party(),
            true,
            &mut roller,
            &CombatConfig::default(),
            T0,
        )
        .unwrap();
        state
    }

    fn active_id(state: &CombatState) -> Option<&str> {
        state
            .active_index()
            .map(|i| state.initiative_order[i].participant_id.as_str())
    }

    #[test]
    fn start_rolls_sorts_and_activates_first() {
        let state = started();

        assert_eq!(state.phase, CombatPhase::Active { started_at: T0 });
        assert_eq!((state.current_round, state.current_turn), (1, 0));
        assert_eq!(active_id(&state), Some("rogue"));
        assert!(validate(&state).is_valid());
    }

    #[test]
    fn start_records_roll_mode_and_count() {
        let mut state = CombatState::new();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(10));
        let transition = start_combat(
            &mut state,
            &party(),
            false,
            &mut roller,
            &CombatConfig::default(),
            T0,
        )
        .unwrap();

        let record = &transition.records[0];
        assert_eq!(record.action, CombatAction::CombatStarted);
        assert_eq!((record.round, record.turn), (1, 0));
        assert_eq!(record.details["autoRollInitiative"], DetailValue::Bool(false));
        assert_eq!(record.details["participantCount"], DetailValue::Int(3));
        assert_eq!(transition.snapshot, SnapshotDirective::Save);
    }

    #[test]
    fn start_without_rolling_uses_presets() {
        let roster = vec![
            Participant::new("a", "A", ParticipantKind::Npc, 10).with_initiative(4),
            Participant::new("b", "B", ParticipantKind::Npc, 10),
            Participant::new("c", "C", ParticipantKind::Npc, 10).with_initiative(19),
        ];
        let mut state = CombatState::new();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(20));
        start_combat(&mut state, &roster, false, &mut roller, &CombatConfig::default(), T0)
            .unwrap();

        let order: Vec<(&str, i32)> = state
            .initiative_order
            .iter()
            .map(|e| (e.participant_id.as_str(), e.initiative))
            .collect();
        assert_eq!(order, [("c", 19), ("a", 4), ("b", 0)]);
    }

    #[test]
    fn start_rejects_duplicate_roster_ids() {
        let roster = vec![
            Participant::new("a", "A", ParticipantKind::Npc, 10),
            Participant::new("a", "A again", ParticipantKind::Npc, 12),
        ];
        let mut state = CombatState::new();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(20));
        let result =
            start_combat(&mut state, &roster, true, &mut roller, &CombatConfig::default(), T0);

        assert_eq!(result, Err(TransitionError::DuplicateParticipant("a".into())));
        assert_eq!(state, CombatState::new());
    }

    #[test]
    fn pause_requires_active_combat() {
        let mut state = CombatState::new();
        assert_eq!(
            pause_combat(&mut state, T0),
            Err(TransitionError::NotActive)
        );
        assert_eq!(state.paused_at(), None);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut state = started();
        pause_combat(&mut state, T0 + 500).unwrap();
        assert_eq!(state.paused_at(), Some(T0 + 500));
        assert!(!state.is_active());
        assert_eq!(next_turn(&mut state), Err(TransitionError::NotActive));

        let transition = resume_combat(&mut state, T0 + 1_500).unwrap();
        assert_eq!(state.phase, CombatPhase::Active { started_at: T0 });
        assert_eq!(transition.records[0].details["pausedMs"], DetailValue::Int(1_000));
        assert_eq!(resume_combat(&mut state, T0), Err(TransitionError::NotPaused));
    }

    #[test]
    fn end_computes_duration_and_clears_flags() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        let transition = end_combat(&mut state, T0 + 60_000).unwrap();

        assert_eq!(state.total_duration_ms, 60_000);
        assert_eq!(state.ended_at(), Some(T0 + 60_000));
        assert!(state.initiative_order.iter().all(|e| !e.is_active && !e.has_acted));
        assert_eq!(transition.snapshot, SnapshotDirective::Clear);
        assert_eq!(transition.records[0].details["totalRounds"], DetailValue::Int(1));
        assert_eq!(transition.records[0].details["totalDuration"], DetailValue::Int(60_000));
    }

    #[test]
    fn end_while_paused_subtracts_pause_offset() {
        let mut state = started();
        pause_combat(&mut state, T0 + 20_000).unwrap();
        end_combat(&mut state, T0 + 50_000).unwrap();

        assert_eq!(state.total_duration_ms, 30_000);
        assert_eq!(state.paused_at(), Some(T0 + 20_000));
    }

    #[test]
    fn end_before_start_has_zero_duration() {
        let mut state = CombatState::new();
        end_combat(&mut state, T0).unwrap();
        assert_eq!(state.total_duration_ms, 0);
        assert!(state.phase.is_ended());
    }

    #[test]
    fn next_turn_wraps_into_new_round() {
        let mut state = CombatState {
            phase: CombatPhase::Active { started_at: T0 },
            current_round: 2,
            current_turn: 1,
            initiative_order: vec![
                CombatantEntry::new("a".into(), 15, 10).with_acted(true),
                CombatantEntry::new("b".into(), 10, 10).with_active(true),
            ],
            total_duration_ms: 0,
        };
        let transition = next_turn(&mut state).unwrap();

        assert_eq!((state.current_round, state.current_turn), (3, 0));
        assert!(state.initiative_order.iter().all(|e| !e.has_acted));
        assert!(state.initiative_order[0].is_active);
        assert!(!state.initiative_order[1].is_active);

        let actions: Vec<CombatAction> = transition.records.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            [
                CombatAction::TurnEnd,
                CombatAction::RoundEnd,
                CombatAction::RoundStart,
                CombatAction::TurnStart,
            ]
        );
        assert_eq!(transition.records[1].round, 2);
        assert_eq!(transition.records[2].round, 3);
    }

    #[test]
    fn next_turn_marks_previous_as_acted() {
        let mut state = started();
        next_turn(&mut state).unwrap();

        assert_eq!(state.current_turn, 1);
        assert!(state.initiative_order[0].has_acted);
        assert!(!state.initiative_order[0].is_active);
        assert_eq!(active_id(&state), Some("fighter"));
    }

    #[test]
    fn next_turn_refuses_empty_order() {
        let mut state = CombatState {
            phase: CombatPhase::Active { started_at: T0 },
            current_round: 1,
            ..CombatState::default()
        };
        assert_eq!(next_turn(&mut state), Err(TransitionError::EmptyOrder));
        assert_eq!(previous_turn(&mut state), Err(TransitionError::EmptyOrder));
    }

    #[test]
    fn out_of_bounds_turn_is_refused_without_panicking() {
        let mut state = started();
        state.current_turn = 7;
        assert_eq!(
            next_turn(&mut state),
            Err(TransitionError::TurnOutOfBounds { turn: 7, len: 3 })
        );
    }

    #[test]
    fn wrapping_past_the_last_round_is_refused() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        next_turn(&mut state).unwrap();
        state.current_round = i32::MAX;
        assert!(validate(&state).is_valid());
        let before = state.clone();

        let err = next_turn(&mut state).unwrap_err();
        assert_eq!(err, TransitionError::RoundOverflow { round: i32::MAX });
        assert!(err.severity().is_internal());
        assert_eq!(state, before);

        let last = before.initiative_order[2].participant_id.clone();
        assert_eq!(
            remove_combatant(&mut state, &last),
            Err(TransitionError::RoundOverflow { round: i32::MAX })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn last_round_still_advances_within_the_round() {
        let mut state = started();
        state.current_round = i32::MAX;
        next_turn(&mut state).unwrap();
        assert_eq!((state.current_round, state.current_turn), (i32::MAX, 1));
    }

    #[test]
    fn previous_turn_never_drops_below_round_one() {
        let mut state = started();
        previous_turn(&mut state).unwrap();

        assert_eq!(state.current_round, 1);
        assert_eq!(state.current_turn, 2);
        assert_eq!(active_id(&state), Some("orc"));
    }

    #[test]
    fn previous_turn_wraps_to_previous_round() {
        let mut state = started();
        for _ in 0..3 {
            next_turn(&mut state).unwrap();
        }
        assert_eq!((state.current_round, state.current_turn), (2, 0));

        let transition = previous_turn(&mut state).unwrap();
        assert_eq!((state.current_round, state.current_turn), (1, 2));
        assert_eq!(transition.records[0].action, CombatAction::RoundStart);
        assert_eq!(transition.records[1].action, CombatAction::TurnStart);
    }

    #[test]
    fn set_initiative_follows_the_acting_combatant() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        assert_eq!(active_id(&state), Some("fighter"));

        set_initiative(&mut state, &"orc".into(), 25, 12).unwrap();

        let ids: Vec<&str> = state
            .initiative_order
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect();
        assert_eq!(ids, ["orc", "rogue", "fighter"]);
        assert_eq!(state.current_turn, 2);
        assert_eq!(
            state.current_entry().map(|e| e.participant_id.as_str()),
            Some("fighter")
        );
    }

    #[test]
    fn set_initiative_unknown_participant() {
        let mut state = started();
        let before = state.clone();
        assert_eq!(
            set_initiative(&mut state, &"ghost".into(), 1, 1),
            Err(TransitionError::ParticipantNotFound("ghost".into()))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn reroll_keeps_turn_on_acting_combatant() {
        let mut state = started();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(20));
        reroll_initiative(&mut state, Some(&"orc".into()), &mut roller).unwrap();

        assert_eq!(state.initiative_order[0].participant_id.as_str(), "orc");
        assert_eq!(state.initiative_order[0].initiative, 21);
        assert_eq!(active_id(&state), Some("rogue"));
        assert_eq!(state.current_turn, 1);

        assert_eq!(
            reroll_initiative(&mut state, Some(&"ghost".into()), &mut roller),
            Err(TransitionError::ParticipantNotFound("ghost".into()))
        );
    }

    #[test]
    fn add_combatant_mid_combat() {
        let mut state = started();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(20));
        let goblin = Participant::new("goblin", "Goblin", ParticipantKind::Monster, 14);
        add_combatant(&mut state, &goblin, true, &mut roller, &CombatConfig::default()).unwrap();

        assert_eq!(state.initiative_order.len(), 4);
        assert_eq!(state.initiative_order[0].participant_id.as_str(), "goblin");
        assert_eq!(active_id(&state), Some("rogue"));
        assert_eq!(state.current_turn, 1);
        assert!(validate(&state).is_valid());

        assert_eq!(
            add_combatant(&mut state, &goblin, true, &mut roller, &CombatConfig::default()),
            Err(TransitionError::DuplicateParticipant("goblin".into()))
        );
    }

    #[test]
    fn add_to_empty_combat_gives_the_newcomer_the_turn() {
        let mut state = CombatState::new();
        let mut roller = InitiativeRoller::new(ScriptedDice::constant(12));
        start_combat(&mut state, &[], true, &mut roller, &CombatConfig::default(), T0).unwrap();

        let hero = Participant::new("hero", "Hero", ParticipantKind::Player, 10);
        let transition =
            add_combatant(&mut state, &hero, true, &mut roller, &CombatConfig::default()).unwrap();

        assert_eq!(active_id(&state), Some("hero"));
        assert_eq!(transition.records.last().map(|r| r.action), Some(CombatAction::TurnStart));
        assert!(validate(&state).is_valid());
    }

    #[test]
    fn removing_the_acting_combatant_passes_the_turn() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        remove_combatant(&mut state, &"fighter".into()).unwrap();

        assert_eq!(state.current_turn, 1);
        assert_eq!(active_id(&state), Some("orc"));
        assert!(validate(&state).is_valid());
    }

    #[test]
    fn removing_the_last_acting_combatant_wraps_the_round() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        next_turn(&mut state).unwrap();
        assert_eq!(active_id(&state), Some("orc"));

        remove_combatant(&mut state, &"orc".into()).unwrap();
        assert_eq!((state.current_round, state.current_turn), (2, 0));
        assert_eq!(active_id(&state), Some("rogue"));
        assert!(state.initiative_order.iter().all(|e| !e.has_acted));
    }

    #[test]
    fn removing_an_earlier_combatant_shifts_the_turn() {
        let mut state = started();
        next_turn(&mut state).unwrap();
        next_turn(&mut state).unwrap();
        remove_combatant(&mut state, &"rogue".into()).unwrap();

        assert_eq!(state.current_turn, 1);
        assert_eq!(active_id(&state), Some("orc"));
    }

    #[test]
    fn removing_everyone_resets_the_turn() {
        let mut state = started();
        for id in ["rogue", "fighter", "orc"] {
            remove_combatant(&mut state, &id.into()).unwrap();
        }
        assert!(state.initiative_order.is_empty());
        assert_eq!(state.current_turn, 0);
        assert!(validate(&state).is_valid());
    }

    fn order_of(len: usize) -> Vec<CombatantEntry> {
        (0..len)
            .map(|i| CombatantEntry::new(format!("c{i}").into(), 20 - i as i32, 10))
            .collect()
    }

    proptest! {
        #[test]
        fn full_cycle_returns_to_turn_zero_next_round(len in 1usize..12, round in 1i32..50) {
            let mut order = order_of(len);
            order[0].is_active = true;
            let mut state = CombatState {
                phase: CombatPhase::Active { started_at: T0 },
                current_round: round,
                current_turn: 0,
                initiative_order: order,
                total_duration_ms: 0,
            };

            for _ in 0..len {
                next_turn(&mut state).unwrap();
            }

            prop_assert_eq!(state.current_turn, 0);
            prop_assert_eq!(state.current_round, round + 1);
            prop_assert!(validate(&state).is_valid());
        }

        #[test]
        fn next_then_previous_restores_position(len in 2usize..12, turn_seed in 0usize..64, round in 1i32..20) {
            let turn = 1 + turn_seed % (len - 1);
            let mut order = order_of(len);
            order[turn].is_active = true;
            let mut state = CombatState {
                phase: CombatPhase::Active { started_at: T0 },
                current_round: round,
                current_turn: turn as i32,
                initiative_order: order,
                total_duration_ms: 0,
            };
            let before = (state.current_round, state.current_turn, state.active_index());

            next_turn(&mut state).unwrap();
            previous_turn(&mut state).unwrap();

            prop_assert_eq!((state.current_round, state.current_turn, state.active_index()), before);
        }

        #[test]
        fn previous_turn_keeps_round_at_least_one(len in 1usize..8, steps in 1usize..40) {
            let mut state = started();
            state.initiative_order.truncate(len.min(3));
            for _ in 0..steps {
                previous_turn(&mut state).unwrap();
                prop_assert!(state.current_round >= 1);
            }
        }
    }
}
