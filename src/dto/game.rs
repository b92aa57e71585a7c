use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time, parse_system_time,
        validation::{validate_player_ids, validate_timestamp},
    },
    state::{
        error::ValidationError,
        game::{Game, GameDetails, GamePatch},
        lifecycle::GameStatus,
        substitution::Substitution,
    },
};

/// Longest accepted venue name.
const MAX_LOCATION_LEN: u64 = 200;
/// Longest accepted notes.
const MAX_NOTES_LEN: u64 = 2000;

/// Payload used to create a game.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGameRequest {
    pub team_id: String,
    pub opponent: String,
    /// One of `not_started`, `in_progress`, `completed`; defaults to `not_started`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_player_ids"))]
    pub roster: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_player_ids"))]
    pub starting_lineup: Vec<String>,
    /// RFC 3339 tip-off time.
    #[serde(default)]
    #[validate(custom(function = "validate_timestamp"))]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200, message = "Location is too long"))]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub opponent_score: Option<u32>,
}

impl CreateGameRequest {
    /// Split into the required fields and the parsed optional details.
    pub(crate) fn into_parts(self) -> Result<(String, String, GameDetails), ValidationError> {
        let status = self.status.as_deref().map(str::parse::<GameStatus>).transpose()?;
        let scheduled_at = self
            .scheduled_at
            .as_deref()
            .map(|value| parse_system_time("scheduled_at", value))
            .transpose()?;

        let details = GameDetails {
            status,
            roster: self.roster,
            starting_lineup: self.starting_lineup,
            scheduled_at,
            location: self.location,
            notes: self.notes,
            opponent_score: self.opponent_score,
        };
        Ok((self.team_id, self.opponent, details))
    }
}

/// Partial update of a game. Omitted fields stay untouched; `null` clears a
/// nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGameRequest {
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub scheduled_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub opponent_score: Option<Option<u32>>,
}

/// Keep an explicit `null` distinct from a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Validate for UpdateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(Some(ref value)) = self.scheduled_at {
            if let Err(e) = validate_timestamp(value) {
                errors.add("scheduled_at", e);
            }
        }

        if let Some(Some(ref location)) = self.location {
            if location.chars().count() as u64 > MAX_LOCATION_LEN {
                let mut err = validator::ValidationError::new("length");
                err.message = Some("Location is too long".into());
                errors.add("location", err);
            }
        }

        if let Some(Some(ref notes)) = self.notes {
            if notes.chars().count() as u64 > MAX_NOTES_LEN {
                let mut err = validator::ValidationError::new("length");
                err.message = Some("Notes are too long".into());
                errors.add("notes", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl UpdateGameRequest {
    pub(crate) fn into_patch(self) -> Result<GamePatch, ValidationError> {
        let scheduled_at = match self.scheduled_at {
            Some(Some(value)) => Some(Some(parse_system_time("scheduled_at", &value)?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(GamePatch {
            opponent: self.opponent,
            scheduled_at,
            location: self.location,
            notes: self.notes,
            opponent_score: self.opponent_score,
        })
    }
}

/// Replacement roster.
#[derive(Debug, Deserialize, Validate)]
pub struct SetRosterRequest {
    #[validate(custom(function = "validate_player_ids"))]
    pub player_ids: Vec<String>,
}

/// Replacement starting five.
#[derive(Debug, Deserialize, Validate)]
pub struct SetLineupRequest {
    #[validate(custom(function = "validate_player_ids"))]
    pub player_ids: Vec<String>,
}

/// Live swap of one player on court.
#[derive(Debug, Deserialize)]
pub struct SubstitutionRequest {
    pub player_out: String,
    pub player_in: String,
}

/// Optional filters of the game listing; both apply when both are set.
#[derive(Debug, Default, Deserialize)]
pub struct ListGamesQuery {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Summary returned once a game has been created or loaded.
#[derive(Debug, Serialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub team_id: String,
    pub opponent: String,
    pub status: GameStatus,
    pub quarter: u8,
    pub roster: Vec<String>,
    pub starting_lineup: Vec<String>,
    pub current_lineup: Vec<String>,
    pub can_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_score: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<Game> for GameSummary {
    fn from(game: Game) -> Self {
        Self {
            id: game.id(),
            team_id: game.team_id().to_owned(),
            opponent: game.opponent().to_owned(),
            status: game.status(),
            quarter: game.quarter(),
            roster: game.roster().to_vec(),
            starting_lineup: game.starting_lineup().to_vec(),
            current_lineup: game.current_lineup().to_vec(),
            can_start: game.can_start(),
            scheduled_at: game.scheduled_at().map(format_system_time),
            location: game.location().map(str::to_owned),
            notes: game.notes().map(str::to_owned),
            opponent_score: game.opponent_score(),
            created_at: format_system_time(game.created_at()),
            updated_at: format_system_time(game.updated_at()),
            started_at: game.started_at().map(format_system_time),
            completed_at: game.completed_at().map(format_system_time),
        }
    }
}

/// Public projection of a substitution record.
#[derive(Debug, Serialize)]
pub struct SubstitutionSummary {
    pub id: Uuid,
    pub game_id: Uuid,
    pub quarter: u8,
    pub player_out: String,
    pub player_in: String,
    pub timestamp: String,
}

impl From<Substitution> for SubstitutionSummary {
    fn from(substitution: Substitution) -> Self {
        Self {
            id: substitution.id(),
            game_id: substitution.game_id(),
            quarter: substitution.quarter(),
            player_out: substitution.player_out().to_owned(),
            player_in: substitution.player_in().to_owned(),
            timestamp: format_system_time(substitution.timestamp()),
        }
    }
}

/// Game state after a substitution, with the record that was appended.
#[derive(Debug, Serialize)]
pub struct SubstitutionOutcome {
    pub game: GameSummary,
    pub substitution: SubstitutionSummary,
}

/// Counts of what [`delete_owner_data`](crate::services::game_service::delete_owner_data) removed.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct OwnerPurgeSummary {
    pub games: u64,
    pub substitutions: u64,
    pub player_stats: u64,
}
