use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_player_id},
    state::{
        ledger::{ActionEntry, ActionKind, GameStatLine, PlayerActionLedger},
        lifecycle::GameStatus,
    },
};

/// One event recorded for a player.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordActionRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: String,
    pub kind: ActionKind,
    /// Shot result, required for `free_throw`, `two_point` and `three_point`.
    #[serde(default)]
    pub made: Option<bool>,
}

/// Court time to add to a player's ledger.
#[derive(Debug, Deserialize, Validate)]
pub struct AddMinutesRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub player_id: String,
    #[validate(range(min = 1, max = 60, message = "Minutes must be between 1 and 60"))]
    pub minutes: u32,
}

/// Statistics of one player in one game.
#[derive(Debug, Serialize)]
pub struct PlayerGameStats {
    /// Absent until the first action is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<Uuid>,
    pub game_id: Uuid,
    pub player_id: String,
    #[serde(flatten)]
    pub stats: GameStatLine,
    pub actions_recorded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PlayerGameStats {
    /// Zero line for a player without a ledger.
    pub fn empty(game_id: Uuid, player_id: &str) -> Self {
        Self {
            ledger_id: None,
            game_id,
            player_id: player_id.to_owned(),
            stats: GameStatLine::empty(),
            actions_recorded: 0,
            updated_at: None,
        }
    }
}

impl From<&PlayerActionLedger> for PlayerGameStats {
    fn from(ledger: &PlayerActionLedger) -> Self {
        Self {
            ledger_id: Some(ledger.id()),
            game_id: ledger.game_id(),
            player_id: ledger.player_id().to_owned(),
            stats: ledger.stat_line(),
            actions_recorded: ledger.action_history().len(),
            updated_at: Some(format_system_time(ledger.updated_at())),
        }
    }
}

/// Result of an undo: the removed entry and the reverted statistics.
#[derive(Debug, Serialize)]
pub struct UndoSummary {
    pub undone: ActionEntry,
    #[serde(flatten)]
    pub stats: PlayerGameStats,
}

/// Per-player lines of one game in roster order, with the team total.
#[derive(Debug, Serialize)]
pub struct BoxScore {
    pub game_id: Uuid,
    pub team_id: String,
    pub opponent: String,
    pub status: GameStatus,
    pub quarter: u8,
    /// Sum of every player's points.
    pub team_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_score: Option<u32>,
    pub players: IndexMap<String, GameStatLine>,
}
