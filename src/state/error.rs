//! Error types raised by the game and ledger entities.
//!
//! Messages are stable: callers match on them, so changing a string is a
//! breaking change.

use thiserror::Error;

/// Malformed entity state detected at construction, update or rehydration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    /// Build a validation error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Illegal transition or violated precondition on a live entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// `start` called on a game that already left the not-started state.
    #[error("Match is already in progress or completed")]
    AlreadyStarted,
    /// `start` called before roster and starting lineup were set.
    #[error("Roster and starting lineup must be set before starting")]
    NotReady,
    /// `complete` called on a game that is not live.
    #[error("Match must be in progress to complete")]
    CompleteRequiresInProgress,
    /// `next_quarter` called on a game that is not live.
    #[error("Match must be in progress")]
    NotInProgress,
    /// `next_quarter` called during the fourth quarter.
    #[error("Already at last quarter")]
    LastQuarter,
    /// Roster edit after the game started.
    #[error("Roster can only be changed before the match starts")]
    RosterLocked,
    /// Starting lineup edit after the game started.
    #[error("Starting lineup can only be changed before the match starts")]
    LineupLocked,
    /// Substitution attempted outside of a live game.
    #[error("Substitutions are only allowed while the match is in progress")]
    SubstitutionNotLive,
    /// The outgoing player is not on court.
    #[error("Player {0} is not in the current lineup")]
    NotOnCourt(String),
    /// The incoming player is not part of the roster.
    #[error("Player {0} is not in the roster")]
    NotInRoster(String),
    /// The incoming player is already on court.
    #[error("Player {0} is already in the current lineup")]
    AlreadyOnCourt(String),
    /// Undo requested on an empty action history.
    #[error("No actions to undo")]
    NothingToUndo,
}

/// Any failure raised by a domain entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// See [`StateError`].
    #[error(transparent)]
    State(#[from] StateError),
}

/// Reject empty or whitespace-only required strings.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}
