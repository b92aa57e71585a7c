use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{
    ledger::{ActionEntry, StatCounters},
    lifecycle::GameStatus,
};

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Owner the game is scoped to.
    pub owner_id: String,
    /// Team playing the game.
    pub team_id: String,
    /// Opponent name.
    pub opponent: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current quarter.
    pub quarter: u8,
    /// Eligible players, in insertion order.
    pub roster: Vec<String>,
    /// Players who started on court.
    pub starting_lineup: Vec<String>,
    /// Players currently on court, slot order preserved.
    pub current_lineup: Vec<String>,
    /// Scheduled tip-off.
    pub scheduled_at: Option<SystemTime>,
    /// Venue.
    pub location: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Opponent points, entered by hand.
    pub opponent_score: Option<u32>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
    /// Tip-off timestamp.
    pub started_at: Option<SystemTime>,
    /// Final whistle timestamp.
    pub completed_at: Option<SystemTime>,
    /// Optimistic concurrency version, bumped by the store on every save.
    pub version: u64,
}

/// Substitution record persisted next to its game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstitutionEntity {
    /// Primary key of the record.
    pub id: Uuid,
    /// Game the substitution belongs to.
    pub game_id: Uuid,
    /// Owner the record is scoped to.
    pub owner_id: String,
    /// Quarter during which the swap happened.
    pub quarter: u8,
    /// Player leaving the court.
    pub player_out: String,
    /// Player entering the court.
    pub player_in: String,
    /// When the swap was recorded.
    pub timestamp: SystemTime,
}

/// Per (game, player) statistics ledger persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStatsEntity {
    /// Primary key of the ledger.
    pub id: Uuid,
    /// Game the ledger belongs to.
    pub game_id: Uuid,
    /// Player the ledger tracks.
    pub player_id: String,
    /// Owner the ledger is scoped to.
    pub owner_id: String,
    /// Raw counters.
    #[serde(flatten)]
    pub counters: StatCounters,
    /// Minutes on court.
    pub minutes_played: u32,
    /// Action stack, oldest first.
    pub action_history: Vec<ActionEntry>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the ledger was updated.
    pub updated_at: SystemTime,
    /// Optimistic concurrency version, bumped by the store on every save.
    pub version: u64,
}
