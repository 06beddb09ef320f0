//! Combat action log records.
//!
//! Transitions describe what happened as [`ActionRecord`]s. The runtime's
//! history log stamps each one with its own clock, turning it into an
//! immutable [`CombatActionLogEntry`]; callers never supply timestamps.

use std::collections::BTreeMap;

use strum::{Display, IntoStaticStr};

use crate::state::{ParticipantId, Timestamp};

/// Kinds of logged combat actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CombatAction {
    CombatStarted,
    CombatPaused,
    CombatResumed,
    CombatEnded,
    TurnStart,
    TurnEnd,
    RoundStart,
    RoundEnd,
    InitiativeSet,
    InitiativeRerolled,
    ParticipantAdded,
    ParticipantRemoved,
}

/// Value stored in a log entry's details map.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DetailValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DetailValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for DetailValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub type Details = BTreeMap<String, DetailValue>;

/// A log entry as produced by a transition, before it is timestamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: CombatAction,
    pub round: i32,
    pub turn: i32,
    pub participant_id: Option<ParticipantId>,
    pub details: Details,
}

impl ActionRecord {
    pub fn new(action: CombatAction, round: i32, turn: i32) -> Self {
        Self {
            action,
            round,
            turn,
            participant_id: None,
            details: Details::new(),
        }
    }

    #[must_use]
    pub fn participant(mut self, participant_id: ParticipantId) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    #[must_use]
    pub fn detail(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }

    /// Fixes the record at `timestamp`.
    pub fn stamp(self, timestamp: Timestamp) -> CombatActionLogEntry {
        CombatActionLogEntry {
            action: self.action,
            timestamp,
            round: self.round,
            turn: self.turn,
            participant_id: self.participant_id,
            details: self.details,
        }
    }
}

/// Immutable, timestamped history entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CombatActionLogEntry {
    pub action: CombatAction,
    pub timestamp: Timestamp,
    pub round: i32,
    pub turn: i32,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub participant_id: Option<ParticipantId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Details::is_empty"))]
    pub details: Details,
}

impl CombatActionLogEntry {
    pub fn detail(&self, key: &str) -> Option<&DetailValue> {
        self.details.get(key)
    }
}
