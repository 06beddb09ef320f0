//! Initiative rolling and turn-order sorting.
//!
//! Randomness is injected through [`Dice`] so the rules stay deterministic
//! under test and replay. Ordering is initiative descending, then dexterity
//! descending; full ties keep their input order.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::config::CombatConfig;
use crate::encounter::Participant;
use crate::state::{CombatantEntry, ParticipantId};

/// Source of die rolls.
pub trait Dice {
    /// Rolls one die with `sides` faces, returning a value in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;
}

impl<D: Dice + ?Sized> Dice for &mut D {
    fn roll(&mut self, sides: u32) -> u32 {
        (**self).roll(sides)
    }
}

impl<D: Dice + ?Sized> Dice for Box<D> {
    fn roll(&mut self, sides: u32) -> u32 {
        (**self).roll(sides)
    }
}

/// Dice that replay a fixed sequence of results.
///
/// Once the script runs out the last result repeats. Values are clamped into
/// the die's range.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    last: Option<u32>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            last: None,
        }
    }

    /// Dice that always show `value`.
    pub fn constant(value: u32) -> Self {
        Self {
            rolls: VecDeque::new(),
            last: Some(value),
        }
    }

    /// Rolls still queued before the last value starts repeating.
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        if let Some(next) = self.rolls.pop_front() {
            self.last = Some(next);
        }
        self.last.unwrap_or(1).clamp(1, sides.max(1))
    }
}

/// Breakdown of a single initiative roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitiativeRoll {
    /// `d20_roll + modifier`, never below [`CombatConfig::MIN_INITIATIVE_TOTAL`].
    pub total: i32,
    pub d20_roll: i32,
    pub modifier: i32,
}

/// Dexterity modifier: `floor((dexterity - 10) / 2)`.
pub const fn dexterity_modifier(dexterity: i32) -> i32 {
    dexterity
        .saturating_sub(CombatConfig::DEXTERITY_BASELINE)
        .div_euclid(2)
}

/// Turn-order comparison: initiative descending, then dexterity descending.
pub fn turn_order(a: &CombatantEntry, b: &CombatantEntry) -> Ordering {
    b.initiative
        .cmp(&a.initiative)
        .then_with(|| b.dexterity.cmp(&a.dexterity))
}

/// Sorts entries into turn order. The sort is stable.
pub fn sort_order(entries: &mut [CombatantEntry]) {
    entries.sort_by(turn_order);
}

/// Rolls initiative using an injected [`Dice`] source.
#[derive(Clone, Debug)]
pub struct InitiativeRoller<D> {
    dice: D,
}

impl<D: Dice> InitiativeRoller<D> {
    pub fn new(dice: D) -> Self {
        Self { dice }
    }

    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    pub fn into_dice(self) -> D {
        self.dice
    }

    /// Uniform integer in `1..=20`.
    pub fn roll_d20(&mut self) -> i32 {
        // A d20 result always fits in i32.
        self.dice.roll(CombatConfig::INITIATIVE_DIE_SIDES) as i32
    }

    /// Rolls a d20 and adds the dexterity modifier, clamping the total at 1.
    pub fn roll_with_modifier(&mut self, dexterity: i32) -> InitiativeRoll {
        let d20_roll = self.roll_d20();
        let modifier = dexterity_modifier(dexterity);
        InitiativeRoll {
            total: d20_roll
                .saturating_add(modifier)
                .max(CombatConfig::MIN_INITIATIVE_TOTAL),
            d20_roll,
            modifier,
        }
    }

    /// Rolls every participant independently and returns the sorted order.
    pub fn bulk_roll(&mut self, participants: &[Participant]) -> Vec<CombatantEntry> {
        let mut entries: Vec<CombatantEntry> = participants
            .iter()
            .map(|participant| {
                let roll = self.roll_with_modifier(participant.dexterity);
                CombatantEntry::new(participant.id.clone(), roll.total, participant.dexterity)
            })
            .collect();
        sort_order(&mut entries);
        entries
    }

    /// Rerolls initiative and re-sorts.
    ///
    /// With `participant_id`, only that entry's initiative changes; with
    /// `None`, every entry is rerolled. Dexterity and turn flags are never
    /// touched. An unknown id only re-sorts.
    pub fn reroll(&mut self, entries: &mut [CombatantEntry], participant_id: Option<&ParticipantId>) {
        for entry in entries.iter_mut() {
            let selected = participant_id.is_none_or(|id| &entry.participant_id == id);
            if selected {
                entry.initiative = self.roll_with_modifier(entry.dexterity).total;
            }
        }
        sort_order(entries);
    }
}
