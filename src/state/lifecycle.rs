use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::state::error::{StateError, ValidationError};

/// High-level status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Roster and lineup can still be edited.
    #[default]
    NotStarted,
    /// The game is live: substitutions and quarter changes are allowed.
    InProgress,
    /// Terminal state.
    Completed,
}

impl GameStatus {
    /// Wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::NotStarted => "not_started",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_started" => Ok(GameStatus::NotStarted),
            "in_progress" => Ok(GameStatus::InProgress),
            "completed" => Ok(GameStatus::Completed),
            other => Err(ValidationError::new(
                "status",
                format!("Invalid match status: {other}"),
            )),
        }
    }
}

/// Guarded operations that are subject to the lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Replace the roster.
    EditRoster,
    /// Replace the starting lineup.
    EditLineup,
    /// Tip-off.
    Start,
    /// Swap a player on court.
    Substitute,
    /// Move to the next quarter.
    AdvanceQuarter,
    /// Final whistle.
    Complete,
}

/// Compute the status reached by applying `event` from `status`.
///
/// Only the status part of each guard lives here; data-dependent checks
/// (roster readiness, lineup membership, quarter bound) stay on the entity and
/// always run after this one.
pub fn compute_transition(status: GameStatus, event: GameEvent) -> Result<GameStatus, StateError> {
    let next = match (status, event) {
        (GameStatus::NotStarted, GameEvent::EditRoster) => GameStatus::NotStarted,
        (GameStatus::NotStarted, GameEvent::EditLineup) => GameStatus::NotStarted,
        (GameStatus::NotStarted, GameEvent::Start) => GameStatus::InProgress,
        (GameStatus::InProgress, GameEvent::Substitute) => GameStatus::InProgress,
        (GameStatus::InProgress, GameEvent::AdvanceQuarter) => GameStatus::InProgress,
        (GameStatus::InProgress, GameEvent::Complete) => GameStatus::Completed,
        (_, event) => return Err(rejection(event)),
    };

    Ok(next)
}

fn rejection(event: GameEvent) -> StateError {
    match event {
        GameEvent::EditRoster => StateError::RosterLocked,
        GameEvent::EditLineup => StateError::LineupLocked,
        GameEvent::Start => StateError::AlreadyStarted,
        GameEvent::Substitute => StateError::SubstitutionNotLive,
        GameEvent::AdvanceQuarter => StateError::NotInProgress,
        GameEvent::Complete => StateError::CompleteRequiresInProgress,
    }
}
