use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::PlayerStatsEntity,
    state::error::{StateError, ValidationError, require_text},
};

/// Every event a ledger can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Free throw attempt (1 point when made).
    FreeThrow,
    /// Two-point field goal attempt.
    TwoPoint,
    /// Three-point field goal attempt.
    ThreePoint,
    /// Offensive rebound.
    OffensiveRebound,
    /// Defensive rebound.
    DefensiveRebound,
    /// Assist.
    Assist,
    /// Steal.
    Steal,
    /// Blocked shot.
    Block,
    /// Turnover.
    Turnover,
    /// Personal foul.
    PersonalFoul,
}

impl ActionKind {
    /// All kinds, shooting kinds first.
    pub const ALL: [ActionKind; 10] = [
        ActionKind::FreeThrow,
        ActionKind::TwoPoint,
        ActionKind::ThreePoint,
        ActionKind::OffensiveRebound,
        ActionKind::DefensiveRebound,
        ActionKind::Assist,
        ActionKind::Steal,
        ActionKind::Block,
        ActionKind::Turnover,
        ActionKind::PersonalFoul,
    ];

    /// Whether the kind carries a made/missed flag.
    pub fn is_shot(self) -> bool {
        matches!(tally(self), Tally::Shot { .. })
    }

    /// Wire representation of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::FreeThrow => "free_throw",
            ActionKind::TwoPoint => "two_point",
            ActionKind::ThreePoint => "three_point",
            ActionKind::OffensiveRebound => "offensive_rebound",
            ActionKind::DefensiveRebound => "defensive_rebound",
            ActionKind::Assist => "assist",
            ActionKind::Steal => "steal",
            ActionKind::Block => "block",
            ActionKind::Turnover => "turnover",
            ActionKind::PersonalFoul => "personal_foul",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the action history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// What happened.
    pub kind: ActionKind,
    /// Shot result; `None` for non-shooting kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub made: Option<bool>,
}

impl ActionEntry {
    fn shot(kind: ActionKind, made: bool) -> Self {
        Self {
            kind,
            made: Some(made),
        }
    }

    fn single(kind: ActionKind) -> Self {
        Self { kind, made: None }
    }
}

/// Raw counters of a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounters {
    /// Free throws made.
    pub free_throws_made: u32,
    /// Free throws attempted.
    pub free_throws_attempted: u32,
    /// Two-pointers made.
    pub two_points_made: u32,
    /// Two-pointers attempted.
    pub two_points_attempted: u32,
    /// Three-pointers made.
    pub three_points_made: u32,
    /// Three-pointers attempted.
    pub three_points_attempted: u32,
    /// Offensive rebounds.
    pub offensive_rebounds: u32,
    /// Defensive rebounds.
    pub defensive_rebounds: u32,
    /// Assists.
    pub assists: u32,
    /// Steals.
    pub steals: u32,
    /// Blocks.
    pub blocks: u32,
    /// Turnovers.
    pub turnovers: u32,
    /// Personal fouls.
    pub personal_fouls: u32,
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    FreeThrowsMade,
    FreeThrowsAttempted,
    TwoPointsMade,
    TwoPointsAttempted,
    ThreePointsMade,
    ThreePointsAttempted,
    OffensiveRebounds,
    DefensiveRebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    PersonalFouls,
}

#[derive(Debug, Clone, Copy)]
enum Tally {
    Shot { made: Counter, attempted: Counter },
    Single(Counter),
}

/// Counters touched by each kind. Recording and undoing both go through this
/// table so the inverse is exact by construction.
fn tally(kind: ActionKind) -> Tally {
    match kind {
        ActionKind::FreeThrow => Tally::Shot {
            made: Counter::FreeThrowsMade,
            attempted: Counter::FreeThrowsAttempted,
        },
        ActionKind::TwoPoint => Tally::Shot {
            made: Counter::TwoPointsMade,
            attempted: Counter::TwoPointsAttempted,
        },
        ActionKind::ThreePoint => Tally::Shot {
            made: Counter::ThreePointsMade,
            attempted: Counter::ThreePointsAttempted,
        },
        ActionKind::OffensiveRebound => Tally::Single(Counter::OffensiveRebounds),
        ActionKind::DefensiveRebound => Tally::Single(Counter::DefensiveRebounds),
        ActionKind::Assist => Tally::Single(Counter::Assists),
        ActionKind::Steal => Tally::Single(Counter::Steals),
        ActionKind::Block => Tally::Single(Counter::Blocks),
        ActionKind::Turnover => Tally::Single(Counter::Turnovers),
        ActionKind::PersonalFoul => Tally::Single(Counter::PersonalFouls),
    }
}

impl StatCounters {
    /// Rebuild counters by replaying `history` from empty.
    pub fn replay(history: &[ActionEntry]) -> Self {
        history.iter().fold(Self::default(), |mut counters, entry| {
            counters.apply(entry);
            counters
        })
    }

    fn slot(&mut self, counter: Counter) -> &mut u32 {
        match counter {
            Counter::FreeThrowsMade => &mut self.free_throws_made,
            Counter::FreeThrowsAttempted => &mut self.free_throws_attempted,
            Counter::TwoPointsMade => &mut self.two_points_made,
            Counter::TwoPointsAttempted => &mut self.two_points_attempted,
            Counter::ThreePointsMade => &mut self.three_points_made,
            Counter::ThreePointsAttempted => &mut self.three_points_attempted,
            Counter::OffensiveRebounds => &mut self.offensive_rebounds,
            Counter::DefensiveRebounds => &mut self.defensive_rebounds,
            Counter::Assists => &mut self.assists,
            Counter::Steals => &mut self.steals,
            Counter::Blocks => &mut self.blocks,
            Counter::Turnovers => &mut self.turnovers,
            Counter::PersonalFouls => &mut self.personal_fouls,
        }
    }

    fn apply(&mut self, entry: &ActionEntry) {
        match tally(entry.kind) {
            Tally::Shot { made, attempted } => {
                *self.slot(attempted) += 1;
                if entry.made == Some(true) {
                    *self.slot(made) += 1;
                }
            }
            Tally::Single(counter) => *self.slot(counter) += 1,
        }
    }

    fn revert(&mut self, entry: &ActionEntry) {
        match tally(entry.kind) {
            Tally::Shot { made, attempted } => {
                let slot = self.slot(attempted);
                *slot = slot.saturating_sub(1);
                if entry.made == Some(true) {
                    let slot = self.slot(made);
                    *slot = slot.saturating_sub(1);
                }
            }
            Tally::Single(counter) => {
                let slot = self.slot(counter);
                *slot = slot.saturating_sub(1);
            }
        }
    }

    /// `1·FT + 2·2PT + 3·3PT` made.
    pub fn total_points(&self) -> u32 {
        self.free_throws_made + 2 * self.two_points_made + 3 * self.three_points_made
    }

    /// Offensive plus defensive rebounds.
    pub fn total_rebounds(&self) -> u32 {
        self.offensive_rebounds + self.defensive_rebounds
    }

    /// Two- and three-point attempts combined.
    pub fn field_goal_percentage(&self) -> f64 {
        percentage(
            u64::from(self.two_points_made) + u64::from(self.three_points_made),
            u64::from(self.two_points_attempted) + u64::from(self.three_points_attempted),
        )
    }

    /// Free throws only.
    pub fn free_throw_percentage(&self) -> f64 {
        percentage(
            u64::from(self.free_throws_made),
            u64::from(self.free_throws_attempted),
        )
    }

    /// Three-point attempts only; two-point attempts never count here.
    pub fn three_point_percentage(&self) -> f64 {
        percentage(
            u64::from(self.three_points_made),
            u64::from(self.three_points_attempted),
        )
    }
}

/// Percentage with one decimal, `0.0` when nothing was attempted.
pub fn percentage(made: u64, attempted: u64) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    (made as f64 / attempted as f64 * 1000.0).round() / 10.0
}

/// Per-game statistics of one player, counters plus derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatLine {
    /// Raw counters.
    #[serde(flatten)]
    pub counters: StatCounters,
    /// Minutes on court.
    pub minutes_played: u32,
    /// Points scored.
    pub total_points: u32,
    /// Rebounds grabbed.
    pub total_rebounds: u32,
    /// Field goal percentage (2PT + 3PT).
    pub field_goal_percentage: f64,
    /// Free throw percentage.
    pub free_throw_percentage: f64,
    /// Three-point percentage.
    pub three_point_percentage: f64,
}

impl GameStatLine {
    /// Stat line of a player without any recorded action.
    pub fn empty() -> Self {
        Self::from_counters(StatCounters::default(), 0)
    }

    fn from_counters(counters: StatCounters, minutes_played: u32) -> Self {
        Self {
            total_points: counters.total_points(),
            total_rebounds: counters.total_rebounds(),
            field_goal_percentage: counters.field_goal_percentage(),
            free_throw_percentage: counters.free_throw_percentage(),
            three_point_percentage: counters.three_point_percentage(),
            counters,
            minutes_played,
        }
    }
}

/// Action log and counters of one player in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerActionLedger {
    id: Uuid,
    game_id: Uuid,
    player_id: String,
    owner_id: String,
    counters: StatCounters,
    minutes_played: u32,
    action_history: Vec<ActionEntry>,
    created_at: SystemTime,
    updated_at: SystemTime,
    version: u64,
}

impl PlayerActionLedger {
    /// Empty ledger for `player_id` in `game_id`.
    pub fn new(game_id: Uuid, player_id: &str, owner_id: &str) -> Result<Self, ValidationError> {
        let now = SystemTime::now();
        let ledger = Self {
            id: Uuid::new_v4(),
            game_id,
            player_id: player_id.to_owned(),
            owner_id: owner_id.to_owned(),
            counters: StatCounters::default(),
            minutes_played: 0,
            action_history: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        };
        ledger.validate()?;
        Ok(ledger)
    }

    /// Check required fields and that the history reproduces the counters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("player_id", &self.player_id, "Player ID is required")?;
        require_text("owner_id", &self.owner_id, "Owner ID is required")?;

        let c = &self.counters;
        let shooting = [
            ("free_throws_made", c.free_throws_made, c.free_throws_attempted),
            ("two_points_made", c.two_points_made, c.two_points_attempted),
            ("three_points_made", c.three_points_made, c.three_points_attempted),
        ];
        for (field, made, attempted) in shooting {
            if made > attempted {
                return Err(ValidationError::new(
                    field,
                    "Made shots cannot exceed attempted shots",
                ));
            }
        }

        if let Some(entry) = self
            .action_history
            .iter()
            .find(|entry| entry.kind.is_shot() != entry.made.is_some())
        {
            return Err(ValidationError::new(
                "action_history",
                format!("Malformed {} entry in action history", entry.kind),
            ));
        }
        if StatCounters::replay(&self.action_history) != self.counters {
            return Err(ValidationError::new(
                "action_history",
                "Action history does not match recorded statistics",
            ));
        }

        Ok(())
    }

    /// Generic entry point: shooting kinds need `made`, other kinds ignore it.
    pub fn record(&mut self, kind: ActionKind, made: Option<bool>) -> Result<(), ValidationError> {
        let entry = if kind.is_shot() {
            let Some(made) = made else {
                return Err(ValidationError::new(
                    "made",
                    format!("Shot result is required for {kind}"),
                ));
            };
            ActionEntry::shot(kind, made)
        } else {
            ActionEntry::single(kind)
        };
        self.push(entry);
        Ok(())
    }

    /// Free throw attempt.
    pub fn record_free_throw(&mut self, made: bool) {
        self.push(ActionEntry::shot(ActionKind::FreeThrow, made));
    }

    /// Two-point attempt.
    pub fn record_two_point(&mut self, made: bool) {
        self.push(ActionEntry::shot(ActionKind::TwoPoint, made));
    }

    /// Three-point attempt.
    pub fn record_three_point(&mut self, made: bool) {
        self.push(ActionEntry::shot(ActionKind::ThreePoint, made));
    }

    /// Offensive rebound.
    pub fn record_offensive_rebound(&mut self) {
        self.push(ActionEntry::single(ActionKind::OffensiveRebound));
    }

    /// Defensive rebound.
    pub fn record_defensive_rebound(&mut self) {
        self.push(ActionEntry::single(ActionKind::DefensiveRebound));
    }

    /// Assist.
    pub fn record_assist(&mut self) {
        self.push(ActionEntry::single(ActionKind::Assist));
    }

    /// Steal.
    pub fn record_steal(&mut self) {
        self.push(ActionEntry::single(ActionKind::Steal));
    }

    /// Block.
    pub fn record_block(&mut self) {
        self.push(ActionEntry::single(ActionKind::Block));
    }

    /// Turnover.
    pub fn record_turnover(&mut self) {
        self.push(ActionEntry::single(ActionKind::Turnover));
    }

    /// Personal foul.
    pub fn record_personal_foul(&mut self) {
        self.push(ActionEntry::single(ActionKind::PersonalFoul));
    }

    /// Add court time. Not part of the history, so it cannot be undone.
    pub fn add_minutes(&mut self, minutes: u32) -> Result<(), ValidationError> {
        let Some(total) = self.minutes_played.checked_add(minutes) else {
            return Err(ValidationError::new(
                "minutes_played",
                "Minutes played out of range",
            ));
        };
        self.minutes_played = total;
        self.touch();
        Ok(())
    }

    /// Pop the most recent action and revert its counters.
    pub fn undo_last_action(&mut self) -> Result<ActionEntry, StateError> {
        let entry = self.action_history.pop().ok_or(StateError::NothingToUndo)?;
        self.counters.revert(&entry);
        self.touch();
        Ok(entry)
    }

    fn push(&mut self, entry: ActionEntry) {
        self.counters.apply(&entry);
        self.action_history.push(entry);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Snapshot of counters and derived values.
    pub fn stat_line(&self) -> GameStatLine {
        GameStatLine::from_counters(self.counters, self.minutes_played)
    }

    /// Identifier of the ledger.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Game the ledger belongs to.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Player the ledger tracks.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Owner the ledger is scoped to.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Raw counters.
    pub fn counters(&self) -> &StatCounters {
        &self.counters
    }

    /// Minutes on court.
    pub fn minutes_played(&self) -> u32 {
        self.minutes_played
    }

    /// History stack, oldest first.
    pub fn action_history(&self) -> &[ActionEntry] {
        &self.action_history
    }

    /// Points scored in this game.
    pub fn total_points(&self) -> u32 {
        self.counters.total_points()
    }

    /// Rebounds in this game.
    pub fn total_rebounds(&self) -> u32 {
        self.counters.total_rebounds()
    }

    /// Field goal percentage in this game.
    pub fn field_goal_percentage(&self) -> f64 {
        self.counters.field_goal_percentage()
    }

    /// Free throw percentage in this game.
    pub fn free_throw_percentage(&self) -> f64 {
        self.counters.free_throw_percentage()
    }

    /// Three-point percentage in this game.
    pub fn three_point_percentage(&self) -> f64 {
        self.counters.three_point_percentage()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Last mutation timestamp.
    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    /// Storage version the ledger was loaded at.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl From<PlayerActionLedger> for PlayerStatsEntity {
    fn from(value: PlayerActionLedger) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            player_id: value.player_id,
            owner_id: value.owner_id,
            counters: value.counters,
            minutes_played: value.minutes_played,
            action_history: value.action_history,
            created_at: value.created_at,
            updated_at: value.updated_at,
            version: value.version,
        }
    }
}

impl TryFrom<PlayerStatsEntity> for PlayerActionLedger {
    type Error = ValidationError;

    fn try_from(value: PlayerStatsEntity) -> Result<Self, Self::Error> {
        let ledger = Self {
            id: value.id,
            game_id: value.game_id,
            player_id: value.player_id,
            owner_id: value.owner_id,
            counters: value.counters,
            minutes_played: value.minutes_played,
            action_history: value.action_history,
            created_at: value.created_at,
            updated_at: value.updated_at,
            version: value.version,
        };
        ledger.validate()?;
        Ok(ledger)
    }
}
