//! Common error infrastructure for combat-core.
//!
//! Transitions that cannot apply report a [`TransitionError`]. None of these
//! are fatal: a refused transition leaves the state exactly as it was, and the
//! runtime reports it to callers as a `false` return.

use crate::state::ParticipantId;

/// Severity level of an error, used for categorization and logging priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The combat is not in a phase that allows the operation.
    ///
    /// Examples: pausing inactive combat, advancing an empty order
    Precondition,

    /// The request names something that does not exist or already exists.
    ///
    /// Examples: unknown participant, duplicate participant
    Validation,

    /// The state itself is inconsistent and needs investigation.
    ///
    /// Examples: turn index outside the initiative order
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates corrupted state rather than a bad request.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for combat-core errors.
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

/// Reasons a state-machine transition was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("combat is not active")]
    NotActive,

    #[error("combat is not paused")]
    NotPaused,

    #[error("initiative order is empty")]
    EmptyOrder,

    #[error("current turn {turn} is outside an initiative order of {len}")]
    TurnOutOfBounds { turn: i32, len: usize },

    #[error("round {round} is the last representable round")]
    RoundOverflow { round: i32 },

    #[error("participant {0} is not in the initiative order")]
    ParticipantNotFound(ParticipantId),

    #[error("participant {0} is already in the initiative order")]
    DuplicateParticipant(ParticipantId),
}

impl CombatError for TransitionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotActive | Self::NotPaused | Self::EmptyOrder => ErrorSeverity::Precondition,
            Self::ParticipantNotFound(_) | Self::DuplicateParticipant(_) => {
                ErrorSeverity::Validation
            }
            Self::TurnOutOfBounds { .. } | Self::RoundOverflow { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotActive => "NOT_ACTIVE",
            Self::NotPaused => "NOT_PAUSED",
            Self::EmptyOrder => "EMPTY_ORDER",
            Self::TurnOutOfBounds { .. } => "TURN_OUT_OF_BOUNDS",
            Self::RoundOverflow { .. } => "ROUND_OVERFLOW",
            Self::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            Self::DuplicateParticipant(_) => "DUPLICATE_PARTICIPANT",
        }
    }
}
