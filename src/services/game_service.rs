//! Use-cases driving a game through its lifecycle: creation, roster and
//! lineup setup, tip-off, quarters, substitutions and deletion.
//!
//! Every mutation is a load-mutate-save under the game's write lock; the
//! store's version check catches writers that bypass it.

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{
        CreateGameRequest, GameSummary, ListGamesQuery, OwnerPurgeSummary, SetLineupRequest,
        SetRosterRequest, SubstitutionOutcome, SubstitutionRequest, SubstitutionSummary,
        UpdateGameRequest,
    },
    error::ServiceError,
    state::{
        SharedState,
        game::Game,
        lifecycle::GameStatus,
        substitution::{Substitution, sort_chronologically},
    },
};

/// Fetch a game of `owner_id`, rehydrating and re-validating it.
pub(crate) async fn load_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<Game, ServiceError> {
    let Some(entity) = state.store().find_game(id, owner_id).await? else {
        return Err(ServiceError::NotFound("Match not found".into()));
    };
    Ok(Game::try_from(entity)?)
}

async fn persist(state: &SharedState, game: Game) -> Result<Game, ServiceError> {
    let saved = state.store().save_game(game.into()).await?;
    Ok(Game::try_from(saved)?)
}

/// Run `apply` on the stored game and persist the result.
async fn mutate_game<F>(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
    operation: &'static str,
    apply: F,
) -> Result<GameSummary, ServiceError>
where
    F: FnOnce(&mut Game) -> Result<(), ServiceError>,
{
    let _guard = state.lock_game(id).await;
    let mut game = load_game(state, id, owner_id).await?;

    if let Err(err) = apply(&mut game) {
        warn!(game_id = %id, owner_id, operation, error = %err, "game operation rejected");
        return Err(err);
    }

    let game = persist(state, game).await.inspect_err(|err| {
        warn!(game_id = %id, owner_id, operation, error = %err, "failed to persist game");
    })?;
    info!(
        game_id = %id,
        owner_id,
        operation,
        status = %game.status(),
        quarter = game.quarter(),
        "game updated"
    );
    Ok(game.into())
}

/// Create a game for `owner_id`.
pub async fn create_game(
    state: &SharedState,
    owner_id: &str,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    let (team_id, opponent, details) = request.into_parts()?;

    let game = Game::create(owner_id, &team_id, &opponent, details)?;
    let game = persist(state, game).await?;
    info!(
        game_id = %game.id(),
        owner_id,
        team_id = %game.team_id(),
        status = %game.status(),
        "game created"
    );
    Ok(game.into())
}

/// Fetch one game.
pub async fn get_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<GameSummary, ServiceError> {
    let game = load_game(state, id, owner_id).await?;
    debug!(game_id = %id, owner_id, "game loaded");
    Ok(game.into())
}

/// Games of `owner_id`, oldest first, optionally narrowed by team and status.
pub async fn list_games(
    state: &SharedState,
    owner_id: &str,
    query: ListGamesQuery,
) -> Result<Vec<GameSummary>, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<GameStatus>)
        .transpose()?;

    let store = state.store();
    let entities = match (query.team_id.as_deref(), status) {
        (Some(team_id), _) => store.list_games_by_team(team_id, owner_id).await?,
        (None, Some(status)) => store.list_games_by_status(status, owner_id).await?,
        (None, None) => store.list_games_by_owner(owner_id).await?,
    };

    entities
        .into_iter()
        .filter(|entity| status.is_none_or(|status| entity.status == status))
        .map(|entity| {
            Game::try_from(entity)
                .map(GameSummary::from)
                .map_err(ServiceError::from)
        })
        .collect()
}

/// Patch the whitelisted descriptive fields of a game.
pub async fn update_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
    request: UpdateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    let patch = request.into_patch()?;
    mutate_game(state, id, owner_id, "update", |game| Ok(game.update(patch)?)).await
}

/// Delete a game together with its substitutions and player statistics.
pub async fn delete_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<(), ServiceError> {
    {
        let _guard = state.lock_game(id).await;
        if !state.store().delete_game(id, owner_id).await? {
            return Err(ServiceError::NotFound("Match not found".into()));
        }
    }
    state.forget_game(id);
    info!(game_id = %id, owner_id, "game deleted");
    Ok(())
}

/// Replace the roster before tip-off.
pub async fn set_roster(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
    request: SetRosterRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    mutate_game(state, id, owner_id, "set_roster", |game| {
        Ok(game.set_roster(request.player_ids)?)
    })
    .await
}

/// Set the starting five before tip-off.
pub async fn set_starting_lineup(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
    request: SetLineupRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    mutate_game(state, id, owner_id, "set_starting_lineup", |game| {
        Ok(game.set_starting_lineup(request.player_ids)?)
    })
    .await
}

/// Tip-off.
pub async fn start_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<GameSummary, ServiceError> {
    mutate_game(state, id, owner_id, "start", |game| Ok(game.start()?)).await
}

/// Advance to the next quarter.
pub async fn next_quarter(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<GameSummary, ServiceError> {
    mutate_game(state, id, owner_id, "next_quarter", |game| {
        Ok(game.next_quarter()?)
    })
    .await
}

/// Final whistle.
pub async fn complete_game(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<GameSummary, ServiceError> {
    mutate_game(state, id, owner_id, "complete", |game| Ok(game.complete()?)).await
}

/// Swap a player on court and append the substitution record, both in one
/// storage commit.
pub async fn substitute_player(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
    request: SubstitutionRequest,
) -> Result<SubstitutionOutcome, ServiceError> {
    let _guard = state.lock_game(id).await;
    let mut game = load_game(state, id, owner_id).await?;

    let substitution = game
        .substitute_player(&request.player_out, &request.player_in)
        .inspect_err(|err| {
            warn!(
                game_id = %id,
                owner_id,
                player_out = %request.player_out,
                player_in = %request.player_in,
                error = %err,
                "substitution rejected"
            );
        })?;

    let saved = state
        .store()
        .save_game_with_substitution(game.into(), substitution.clone().into())
        .await
        .inspect_err(|err| {
            warn!(game_id = %id, owner_id, error = %err, "failed to commit substitution");
        })?;
    let game = Game::try_from(saved)?;

    info!(
        game_id = %id,
        owner_id,
        quarter = substitution.quarter(),
        player_out = %substitution.player_out(),
        player_in = %substitution.player_in(),
        "substitution recorded"
    );
    Ok(SubstitutionOutcome {
        game: game.into(),
        substitution: substitution.into(),
    })
}

/// Substitutions of a game ordered by quarter then time.
pub async fn list_substitutions(
    state: &SharedState,
    id: Uuid,
    owner_id: &str,
) -> Result<Vec<SubstitutionSummary>, ServiceError> {
    load_game(state, id, owner_id).await?;

    let mut substitutions = state
        .store()
        .list_substitutions_by_game(id, owner_id)
        .await?
        .into_iter()
        .map(Substitution::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    sort_chronologically(&mut substitutions);

    Ok(substitutions.into_iter().map(Into::into).collect())
}

/// Remove every game, substitution and statistics ledger of an owner.
pub async fn delete_owner_data(
    state: &SharedState,
    owner_id: &str,
) -> Result<OwnerPurgeSummary, ServiceError> {
    let store = state.store();
    let game_ids: Vec<Uuid> = store
        .list_games_by_owner(owner_id)
        .await?
        .into_iter()
        .map(|game| game.id)
        .collect();

    let summary = OwnerPurgeSummary {
        substitutions: store.delete_substitutions_by_owner(owner_id).await?,
        player_stats: store.delete_stats_by_owner(owner_id).await?,
        games: store.delete_games_by_owner(owner_id).await?,
    };
    for id in game_ids {
        state.forget_game(id);
    }

    info!(
        owner_id,
        games = summary.games,
        substitutions = summary.substitutions,
        player_stats = summary.player_stats,
        "owner data deleted"
    );
    Ok(summary)
}
