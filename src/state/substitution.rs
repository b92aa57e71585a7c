use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::SubstitutionEntity,
    state::{
        error::{ValidationError, require_text},
        game::{FIRST_QUARTER, LAST_QUARTER},
    },
};

/// Immutable record of one player swap during a live game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    id: Uuid,
    game_id: Uuid,
    owner_id: String,
    quarter: u8,
    player_out: String,
    player_in: String,
    timestamp: SystemTime,
}

impl Substitution {
    /// Record a substitution happening now.
    pub fn new(
        game_id: Uuid,
        owner_id: &str,
        quarter: u8,
        player_out: &str,
        player_in: &str,
    ) -> Result<Self, ValidationError> {
        Self::restore(
            Uuid::new_v4(),
            game_id,
            owner_id.to_owned(),
            quarter,
            player_out.to_owned(),
            player_in.to_owned(),
            SystemTime::now(),
        )
    }

    /// Rebuild a stored substitution, re-checking its invariants.
    pub fn restore(
        id: Uuid,
        game_id: Uuid,
        owner_id: String,
        quarter: u8,
        player_out: String,
        player_in: String,
        timestamp: SystemTime,
    ) -> Result<Self, ValidationError> {
        require_text("owner_id", &owner_id, "Owner ID is required")?;
        require_text("player_out", &player_out, "Player out is required")?;
        require_text("player_in", &player_in, "Player in is required")?;
        if player_out == player_in {
            return Err(ValidationError::new(
                "player_in",
                "Player out and player in must be different",
            ));
        }
        if !(FIRST_QUARTER..=LAST_QUARTER).contains(&quarter) {
            return Err(ValidationError::new(
                "quarter",
                format!("Quarter must be between {FIRST_QUARTER} and {LAST_QUARTER}"),
            ));
        }

        Ok(Self {
            id,
            game_id,
            owner_id,
            quarter,
            player_out,
            player_in,
            timestamp,
        })
    }

    /// Identifier of the record.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Game the substitution belongs to.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Owner the substitution is scoped to.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Quarter during which the swap happened.
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Player leaving the court.
    pub fn player_out(&self) -> &str {
        &self.player_out
    }

    /// Player entering the court.
    pub fn player_in(&self) -> &str {
        &self.player_in
    }

    /// When the swap was recorded.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

/// Order substitutions chronologically within a game.
pub fn sort_chronologically(entries: &mut [Substitution]) {
    entries.sort_by(|a, b| {
        a.quarter
            .cmp(&b.quarter)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
}

impl From<Substitution> for SubstitutionEntity {
    fn from(value: Substitution) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            owner_id: value.owner_id,
            quarter: value.quarter,
            player_out: value.player_out,
            player_in: value.player_in,
            timestamp: value.timestamp,
        }
    }
}

impl TryFrom<SubstitutionEntity> for Substitution {
    type Error = ValidationError;

    fn try_from(value: SubstitutionEntity) -> Result<Self, Self::Error> {
        Self::restore(
            value.id,
            value.game_id,
            value.owner_id,
            value.quarter,
            value.player_out,
            value.player_in,
            value.timestamp,
        )
    }
}
