use super::Timestamp;

/// Lifecycle stage of a combat.
///
/// The phase is the single source of truth for the combat sub-state. The
/// `is_active` flag and the `started_at`/`paused_at`/`ended_at` stamps seen in
/// persisted snapshots are derived from it, never the other way around, so
/// contradictory combinations cannot exist in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "phase", rename_all = "snake_case"))]
pub enum CombatPhase {
    /// Combat has never been started for this state.
    #[default]
    Inactive,
    /// Turns are being taken.
    Active { started_at: Timestamp },
    /// Combat is suspended; turn advancement is refused until resumed.
    Paused {
        started_at: Timestamp,
        paused_at: Timestamp,
    },
    /// Combat is over. A pause stamp survives if combat ended while paused.
    Ended {
        started_at: Option<Timestamp>,
        paused_at: Option<Timestamp>,
        ended_at: Timestamp,
    },
}

/// Flag combinations that do not describe any reachable phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PhaseFlagsError {
    #[error("combat is flagged active but has no start time")]
    ActiveWithoutStart,

    #[error("combat is flagged active but carries a pause or end time")]
    ActiveWithStop,

    #[error("combat is paused but has no start time")]
    PausedWithoutStart,

    #[error("combat has a start time but is neither active, paused nor ended")]
    IdleWithStart,
}

impl CombatPhase {
    /// Rebuilds a phase from the flat flags used by persisted snapshots.
    pub fn from_flags(
        is_active: bool,
        started_at: Option<Timestamp>,
        paused_at: Option<Timestamp>,
        ended_at: Option<Timestamp>,
    ) -> Result<Self, PhaseFlagsError> {
        if is_active {
            let started_at = started_at.ok_or(PhaseFlagsError::ActiveWithoutStart)?;
            if paused_at.is_some() || ended_at.is_some() {
                return Err(PhaseFlagsError::ActiveWithStop);
            }
            return Ok(Self::Active { started_at });
        }

        match (started_at, paused_at, ended_at) {
            (started_at, paused_at, Some(ended_at)) => Ok(Self::Ended {
                started_at,
                paused_at,
                ended_at,
            }),
            (Some(started_at), Some(paused_at), None) => Ok(Self::Paused {
                started_at,
                paused_at,
            }),
            (None, Some(_), None) => Err(PhaseFlagsError::PausedWithoutStart),
            (Some(_), None, None) => Err(PhaseFlagsError::IdleWithStart),
            (None, None, None) => Ok(Self::Inactive),
        }
    }

    /// Whether turns may currently be taken.
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    pub const fn is_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }

    /// Active or paused: a combat that has started and not yet ended.
    pub const fn in_progress(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Paused { .. })
    }

    pub const fn started_at(&self) -> Option<Timestamp> {
        match *self {
            Self::Inactive => None,
            Self::Active { started_at } | Self::Paused { started_at, .. } => Some(started_at),
            Self::Ended { started_at, .. } => started_at,
        }
    }

    pub const fn paused_at(&self) -> Option<Timestamp> {
        match *self {
            Self::Paused { paused_at, .. } => Some(paused_at),
            Self::Ended { paused_at, .. } => paused_at,
            Self::Inactive | Self::Active { .. } => None,
        }
    }

    pub const fn ended_at(&self) -> Option<Timestamp> {
        match *self {
            Self::Ended { ended_at, .. } => Some(ended_at),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active { .. } => "active",
            Self::Paused { .. } => "paused",
            Self::Ended { .. } => "ended",
        }
    }
}
