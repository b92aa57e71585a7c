//! Career statistics derived on demand from a player's ledgers.

use serde::Serialize;

use crate::state::ledger::{PlayerActionLedger, percentage};

/// Summary of one player's games for one owner. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerAggregate {
    /// Player the aggregate describes.
    pub player_id: String,
    /// Number of ledgers (games with at least one recorded action or minute).
    pub games_played: u64,
    /// Sum of points.
    pub total_points: u64,
    /// Sum of rebounds.
    pub total_rebounds: u64,
    /// Sum of assists.
    pub total_assists: u64,
    /// Sum of steals.
    pub total_steals: u64,
    /// Sum of blocks.
    pub total_blocks: u64,
    /// Sum of turnovers.
    pub total_turnovers: u64,
    /// Sum of personal fouls.
    pub total_personal_fouls: u64,
    /// Sum of minutes.
    pub total_minutes: u64,
    /// Points per game.
    pub average_points: f64,
    /// Rebounds per game.
    pub average_rebounds: f64,
    /// Assists per game.
    pub average_assists: f64,
    /// Steals per game.
    pub average_steals: f64,
    /// Blocks per game.
    pub average_blocks: f64,
    /// Turnovers per game.
    pub average_turnovers: f64,
    /// Minutes per game.
    pub average_minutes: f64,
    /// Field goal percentage over all summed attempts.
    pub field_goal_percentage: f64,
    /// Free throw percentage over all summed attempts.
    pub free_throw_percentage: f64,
    /// Three-point percentage over all summed attempts.
    pub three_point_percentage: f64,
}

#[derive(Default)]
struct ShotTotals {
    free_throws_made: u64,
    free_throws_attempted: u64,
    field_goals_made: u64,
    field_goals_attempted: u64,
    three_points_made: u64,
    three_points_attempted: u64,
}

impl CareerAggregate {
    /// Zero-valued aggregate for a player without any ledger.
    pub fn empty(player_id: &str) -> Self {
        Self::from_ledgers(player_id, &[])
    }

    /// Sum `ledgers`; percentages use the summed made/attempted pairs rather
    /// than an average of per-game percentages.
    pub fn from_ledgers(player_id: &str, ledgers: &[PlayerActionLedger]) -> Self {
        let mut aggregate = Self {
            player_id: player_id.to_owned(),
            games_played: u64::try_from(ledgers.len()).unwrap_or(u64::MAX),
            total_points: 0,
            total_rebounds: 0,
            total_assists: 0,
            total_steals: 0,
            total_blocks: 0,
            total_turnovers: 0,
            total_personal_fouls: 0,
            total_minutes: 0,
            average_points: 0.0,
            average_rebounds: 0.0,
            average_assists: 0.0,
            average_steals: 0.0,
            average_blocks: 0.0,
            average_turnovers: 0.0,
            average_minutes: 0.0,
            field_goal_percentage: 0.0,
            free_throw_percentage: 0.0,
            three_point_percentage: 0.0,
        };
        let mut shots = ShotTotals::default();

        for ledger in ledgers {
            let c = ledger.counters();
            aggregate.total_points += u64::from(ledger.total_points());
            aggregate.total_rebounds += u64::from(ledger.total_rebounds());
            aggregate.total_assists += u64::from(c.assists);
            aggregate.total_steals += u64::from(c.steals);
            aggregate.total_blocks += u64::from(c.blocks);
            aggregate.total_turnovers += u64::from(c.turnovers);
            aggregate.total_personal_fouls += u64::from(c.personal_fouls);
            aggregate.total_minutes += u64::from(ledger.minutes_played());

            shots.free_throws_made += u64::from(c.free_throws_made);
            shots.free_throws_attempted += u64::from(c.free_throws_attempted);
            shots.field_goals_made += u64::from(c.two_points_made) + u64::from(c.three_points_made);
            shots.field_goals_attempted +=
                u64::from(c.two_points_attempted) + u64::from(c.three_points_attempted);
            shots.three_points_made += u64::from(c.three_points_made);
            shots.three_points_attempted += u64::from(c.three_points_attempted);
        }

        let games = aggregate.games_played;
        aggregate.average_points = per_game(aggregate.total_points, games);
        aggregate.average_rebounds = per_game(aggregate.total_rebounds, games);
        aggregate.average_assists = per_game(aggregate.total_assists, games);
        aggregate.average_steals = per_game(aggregate.total_steals, games);
        aggregate.average_blocks = per_game(aggregate.total_blocks, games);
        aggregate.average_turnovers = per_game(aggregate.total_turnovers, games);
        aggregate.average_minutes = per_game(aggregate.total_minutes, games);

        aggregate.field_goal_percentage =
            percentage(shots.field_goals_made, shots.field_goals_attempted);
        aggregate.free_throw_percentage =
            percentage(shots.free_throws_made, shots.free_throws_attempted);
        aggregate.three_point_percentage =
            percentage(shots.three_points_made, shots.three_points_attempted);

        aggregate
    }
}

fn per_game(sum: u64, games: u64) -> f64 {
    if games == 0 {
        return 0.0;
    }
    (sum as f64 / games as f64 * 10.0).round() / 10.0
}
