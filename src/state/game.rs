use std::{collections::HashSet, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::models::GameEntity,
    state::{
        error::{DomainError, StateError, ValidationError, require_text},
        lifecycle::{GameEvent, GameStatus, compute_transition},
        substitution::Substitution,
    },
};

/// Players on court at any time once the game starts.
pub const LINEUP_SIZE: usize = 5;
/// Smallest roster accepted by [`Game::set_roster`].
pub const MIN_ROSTER: usize = 5;
/// Largest roster accepted by [`Game::set_roster`].
pub const MAX_ROSTER: usize = 15;
/// Quarter a game starts in.
pub const FIRST_QUARTER: u8 = 1;
/// Quarter after which [`Game::next_quarter`] is refused.
pub const LAST_QUARTER: u8 = 4;

/// Optional fields accepted when creating a game.
#[derive(Debug, Clone, Default)]
pub struct GameDetails {
    /// Initial status, `not_started` when omitted.
    pub status: Option<GameStatus>,
    /// Initial roster.
    pub roster: Vec<String>,
    /// Initial starting lineup; also seeds the current lineup.
    pub starting_lineup: Vec<String>,
    /// Scheduled tip-off.
    pub scheduled_at: Option<SystemTime>,
    /// Venue.
    pub location: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Points scored by the opponent, entered by hand.
    pub opponent_score: Option<u32>,
}

/// Whitelisted fields that may change after creation.
///
/// The outer `Option` means "leave untouched"; for nullable fields the inner
/// `None` clears the value.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    /// New opponent name.
    pub opponent: Option<String>,
    /// New scheduled tip-off.
    pub scheduled_at: Option<Option<SystemTime>>,
    /// New venue.
    pub location: Option<Option<String>>,
    /// New notes.
    pub notes: Option<Option<String>>,
    /// New opponent score.
    pub opponent_score: Option<Option<u32>>,
}

/// A single game with its lifecycle, roster and lineups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    id: Uuid,
    owner_id: String,
    team_id: String,
    opponent: String,
    status: GameStatus,
    quarter: u8,
    roster: Vec<String>,
    starting_lineup: Vec<String>,
    current_lineup: Vec<String>,
    scheduled_at: Option<SystemTime>,
    location: Option<String>,
    notes: Option<String>,
    opponent_score: Option<u32>,
    created_at: SystemTime,
    updated_at: SystemTime,
    started_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    version: u64,
}

impl Game {
    /// Create a game, not started unless `details.status` says otherwise.
    ///
    /// A game created already live or finished gets its start (and completion)
    /// timestamp set to the creation time.
    pub fn create(
        owner_id: &str,
        team_id: &str,
        opponent: &str,
        details: GameDetails,
    ) -> Result<Self, ValidationError> {
        let now = SystemTime::now();
        let status = details.status.unwrap_or_default();
        let current_lineup = details.starting_lineup.clone();
        let game = Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_owned(),
            team_id: team_id.to_owned(),
            opponent: opponent.to_owned(),
            status,
            quarter: FIRST_QUARTER,
            roster: details.roster,
            starting_lineup: details.starting_lineup,
            current_lineup,
            scheduled_at: details.scheduled_at,
            location: details.location,
            notes: details.notes,
            opponent_score: details.opponent_score,
            created_at: now,
            updated_at: now,
            started_at: (status != GameStatus::NotStarted).then_some(now),
            completed_at: (status == GameStatus::Completed).then_some(now),
            version: 0,
        };
        game.validate()?;
        Ok(game)
    }

    /// Check every invariant of the entity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("owner_id", &self.owner_id, "Owner ID is required")?;
        require_text("team_id", &self.team_id, "Team ID is required")?;
        require_text("opponent", &self.opponent, "Opponent is required")?;

        if !(FIRST_QUARTER..=LAST_QUARTER).contains(&self.quarter) {
            return Err(ValidationError::new(
                "quarter",
                format!("Quarter must be between {FIRST_QUARTER} and {LAST_QUARTER}"),
            ));
        }

        if !self.roster.is_empty() {
            check_roster(&self.roster)?;
        }
        if !self.starting_lineup.is_empty() {
            check_lineup(
                "starting_lineup",
                "Starting lineup",
                &self.starting_lineup,
                &self.roster,
            )?;
        }
        if !self.current_lineup.is_empty() {
            check_lineup(
                "current_lineup",
                "Current lineup",
                &self.current_lineup,
                &self.roster,
            )?;
        }
        if self.status != GameStatus::NotStarted && self.current_lineup.len() != LINEUP_SIZE {
            return Err(ValidationError::new(
                "current_lineup",
                "Current lineup must contain exactly 5 players once the match has started",
            ));
        }

        Ok(())
    }

    /// Replace the roster while the game has not started.
    pub fn set_roster(&mut self, ids: Vec<String>) -> Result<(), DomainError> {
        compute_transition(self.status, GameEvent::EditRoster)?;
        check_roster(&ids)?;

        self.roster = ids;
        self.touch();
        Ok(())
    }

    /// Set the starting five; the current lineup follows it.
    pub fn set_starting_lineup(&mut self, ids: Vec<String>) -> Result<(), DomainError> {
        compute_transition(self.status, GameEvent::EditLineup)?;
        check_lineup("starting_lineup", "Starting lineup", &ids, &self.roster)?;

        self.current_lineup = ids.clone();
        self.starting_lineup = ids;
        self.touch();
        Ok(())
    }

    /// Whether roster and starting lineup are ready for tip-off.
    pub fn can_start(&self) -> bool {
        self.roster.len() >= MIN_ROSTER && self.starting_lineup.len() == LINEUP_SIZE
    }

    /// Tip-off. The status guard always runs before the readiness guard.
    pub fn start(&mut self) -> Result<(), StateError> {
        let next = compute_transition(self.status, GameEvent::Start)?;
        if !self.can_start() {
            return Err(StateError::NotReady);
        }

        let now = SystemTime::now();
        self.status = next;
        self.quarter = FIRST_QUARTER;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Final whistle.
    pub fn complete(&mut self) -> Result<(), StateError> {
        let next = compute_transition(self.status, GameEvent::Complete)?;

        let now = SystemTime::now();
        self.status = next;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Move to the next quarter.
    pub fn next_quarter(&mut self) -> Result<(), StateError> {
        compute_transition(self.status, GameEvent::AdvanceQuarter)?;
        if self.quarter >= LAST_QUARTER {
            return Err(StateError::LastQuarter);
        }

        self.quarter += 1;
        self.touch();
        Ok(())
    }

    /// Swap `player_out` for `player_in` in the same lineup slot and return
    /// the substitution record for the current quarter.
    pub fn substitute_player(
        &mut self,
        player_out: &str,
        player_in: &str,
    ) -> Result<Substitution, DomainError> {
        compute_transition(self.status, GameEvent::Substitute)?;

        let Some(slot) = self
            .current_lineup
            .iter()
            .position(|player| player == player_out)
        else {
            return Err(StateError::NotOnCourt(player_out.to_owned()).into());
        };
        if !self.roster.iter().any(|player| player == player_in) {
            return Err(StateError::NotInRoster(player_in.to_owned()).into());
        }
        if self.current_lineup.iter().any(|player| player == player_in) {
            return Err(StateError::AlreadyOnCourt(player_in.to_owned()).into());
        }

        let substitution =
            Substitution::new(self.id, &self.owner_id, self.quarter, player_out, player_in)?;

        self.current_lineup[slot] = player_in.to_owned();
        self.touch();
        Ok(substitution)
    }

    /// Merge whitelisted fields; on failure the game is left untouched.
    pub fn update(&mut self, patch: GamePatch) -> Result<(), ValidationError> {
        let mut next = self.clone();
        if let Some(opponent) = patch.opponent {
            next.opponent = opponent;
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            next.scheduled_at = scheduled_at;
        }
        if let Some(location) = patch.location {
            next.location = location;
        }
        if let Some(notes) = patch.notes {
            next.notes = notes;
        }
        if let Some(opponent_score) = patch.opponent_score {
            next.opponent_score = opponent_score;
        }
        next.validate()?;

        next.updated_at = SystemTime::now();
        *self = next;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Identifier of the game.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owner the game is scoped to.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Team playing the game.
    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    /// Opponent name.
    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    /// Lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Current quarter (1-4).
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Eligible players.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Players who started on court.
    pub fn starting_lineup(&self) -> &[String] {
        &self.starting_lineup
    }

    /// Players currently on court, slot order preserved across substitutions.
    pub fn current_lineup(&self) -> &[String] {
        &self.current_lineup
    }

    /// Scheduled tip-off.
    pub fn scheduled_at(&self) -> Option<SystemTime> {
        self.scheduled_at
    }

    /// Venue.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Free-form notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Opponent points, when entered.
    pub fn opponent_score(&self) -> Option<u32> {
        self.opponent_score
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Last mutation timestamp.
    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    /// Tip-off timestamp.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// Final whistle timestamp.
    pub fn completed_at(&self) -> Option<SystemTime> {
        self.completed_at
    }

    /// Storage version the entity was loaded at.
    pub fn version(&self) -> u64 {
        self.version
    }
}

fn check_roster(ids: &[String]) -> Result<(), ValidationError> {
    if !(MIN_ROSTER..=MAX_ROSTER).contains(&ids.len()) {
        return Err(ValidationError::new(
            "roster",
            format!("Roster must contain between {MIN_ROSTER} and {MAX_ROSTER} players"),
        ));
    }
    if has_duplicates(ids) {
        return Err(ValidationError::new(
            "roster",
            "Roster contains duplicate players",
        ));
    }
    Ok(())
}

fn check_lineup(
    field: &'static str,
    label: &str,
    ids: &[String],
    roster: &[String],
) -> Result<(), ValidationError> {
    if ids.len() != LINEUP_SIZE {
        return Err(ValidationError::new(
            field,
            format!("{label} must contain exactly {LINEUP_SIZE} players"),
        ));
    }
    if has_duplicates(ids) {
        return Err(ValidationError::new(
            field,
            format!("{label} contains duplicate players"),
        ));
    }
    if !ids.iter().all(|id| roster.contains(id)) {
        return Err(ValidationError::new(
            field,
            format!("{label} players must be in the roster"),
        ));
    }
    Ok(())
}

fn has_duplicates(ids: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(ids.len());
    !ids.iter().all(|id| seen.insert(id.as_str()))
}

impl From<Game> for GameEntity {
    fn from(value: Game) -> Self {
        Self {
            id: value.id,
            owner_id: value.owner_id,
            team_id: value.team_id,
            opponent: value.opponent,
            status: value.status,
            quarter: value.quarter,
            roster: value.roster,
            starting_lineup: value.starting_lineup,
            current_lineup: value.current_lineup,
            scheduled_at: value.scheduled_at,
            location: value.location,
            notes: value.notes,
            opponent_score: value.opponent_score,
            created_at: value.created_at,
            updated_at: value.updated_at,
            started_at: value.started_at,
            completed_at: value.completed_at,
            version: value.version,
        }
    }
}

impl TryFrom<GameEntity> for Game {
    type Error = ValidationError;

    fn try_from(value: GameEntity) -> Result<Self, Self::Error> {
        let game = Self {
            id: value.id,
            owner_id: value.owner_id,
            team_id: value.team_id,
            opponent: value.opponent,
            status: value.status,
            quarter: value.quarter,
            roster: value.roster,
            starting_lineup: value.starting_lineup,
            current_lineup: value.current_lineup,
            scheduled_at: value.scheduled_at,
            location: value.location,
            notes: value.notes,
            opponent_score: value.opponent_score,
            created_at: value.created_at,
            updated_at: value.updated_at,
            started_at: value.started_at,
            completed_at: value.completed_at,
            version: value.version,
        };
        game.validate()?;
        Ok(game)
    }
}
