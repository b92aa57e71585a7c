//! Use-cases recording player actions during a game and reading per-game
//! statistics back.
//!
//! A ledger is created lazily on its first successful write. Writes to one
//! (game, player) ledger are serialized through [`AppState::lock_ledger`].
//!
//! [`AppState::lock_ledger`]: crate::state::AppState::lock_ledger

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::stats::{AddMinutesRequest, BoxScore, PlayerGameStats, RecordActionRequest, UndoSummary},
    error::ServiceError,
    services::game_service::load_game,
    state::{
        SharedState,
        error::StateError,
        ledger::{GameStatLine, PlayerActionLedger},
    },
};

/// Load the ledger of `player_id`, run `apply` on it and persist it.
///
/// The game must exist for `owner_id` and list the player in its roster.
async fn update_ledger<F, T>(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
    player_id: &str,
    operation: &'static str,
    apply: F,
) -> Result<(PlayerActionLedger, T), ServiceError>
where
    F: FnOnce(&mut PlayerActionLedger) -> Result<T, ServiceError>,
{
    let game = load_game(state, game_id, owner_id).await?;
    if !game.roster().iter().any(|id| id == player_id) {
        return Err(StateError::NotInRoster(player_id.to_owned()).into());
    }

    let _guard = state.lock_ledger(game_id, player_id).await;
    let mut ledger = match state
        .store()
        .find_stats_for(game_id, player_id, owner_id)
        .await?
    {
        Some(entity) => PlayerActionLedger::try_from(entity)?,
        None => PlayerActionLedger::new(game_id, player_id, owner_id)?,
    };

    let value = apply(&mut ledger).inspect_err(|err| {
        warn!(%game_id, owner_id, player_id, operation, error = %err, "ledger operation rejected");
    })?;

    let saved = state
        .store()
        .save_stats(ledger.into())
        .await
        .inspect_err(|err| {
            warn!(
                %game_id,
                owner_id,
                player_id,
                operation,
                error = %err,
                "failed to persist ledger"
            );
        })?;
    let ledger = PlayerActionLedger::try_from(saved)?;
    Ok((ledger, value))
}

/// Record one action for a player of the game.
pub async fn record_action(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
    request: RecordActionRequest,
) -> Result<PlayerGameStats, ServiceError> {
    request.validate()?;
    let RecordActionRequest {
        player_id,
        kind,
        made,
    } = request;

    let (ledger, ()) = update_ledger(
        state,
        game_id,
        owner_id,
        &player_id,
        "record_action",
        |ledger| Ok(ledger.record(kind, made)?),
    )
    .await?;

    info!(
        %game_id,
        owner_id,
        player_id = %player_id,
        kind = %kind,
        made = ?made,
        total_points = ledger.total_points(),
        "action recorded"
    );
    Ok(PlayerGameStats::from(&ledger))
}

/// Add court time to a player's ledger. Minutes are not part of the undo history.
pub async fn add_minutes(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
    request: AddMinutesRequest,
) -> Result<PlayerGameStats, ServiceError> {
    request.validate()?;
    let AddMinutesRequest { player_id, minutes } = request;

    let (ledger, ()) = update_ledger(
        state,
        game_id,
        owner_id,
        &player_id,
        "add_minutes",
        |ledger| Ok(ledger.add_minutes(minutes)?),
    )
    .await?;

    info!(
        %game_id,
        owner_id,
        player_id = %player_id,
        minutes,
        minutes_played = ledger.minutes_played(),
        "minutes added"
    );
    Ok(PlayerGameStats::from(&ledger))
}

/// Revert the most recent action of a player.
pub async fn undo_last_action(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
    player_id: &str,
) -> Result<UndoSummary, ServiceError> {
    let (ledger, undone) = update_ledger(state, game_id, owner_id, player_id, "undo", |ledger| {
        Ok(ledger.undo_last_action()?)
    })
    .await?;

    info!(
        %game_id,
        owner_id,
        player_id,
        kind = %undone.kind,
        total_points = ledger.total_points(),
        "action undone"
    );
    Ok(UndoSummary {
        undone,
        stats: PlayerGameStats::from(&ledger),
    })
}

/// Statistics of one player in one game; a zero line when nothing was recorded yet.
pub async fn get_player_game_stats(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
    player_id: &str,
) -> Result<PlayerGameStats, ServiceError> {
    load_game(state, game_id, owner_id).await?;

    let stats = match state
        .store()
        .find_stats_for(game_id, player_id, owner_id)
        .await?
    {
        Some(entity) => PlayerGameStats::from(&PlayerActionLedger::try_from(entity)?),
        None => PlayerGameStats::empty(game_id, player_id),
    };
    debug!(%game_id, owner_id, player_id, "player game stats loaded");
    Ok(stats)
}

/// Every player's line for a game in roster order, with the team total.
pub async fn get_game_box_score(
    state: &SharedState,
    game_id: Uuid,
    owner_id: &str,
) -> Result<BoxScore, ServiceError> {
    let game = load_game(state, game_id, owner_id).await?;
    let ledgers = state
        .store()
        .list_stats_by_game(game_id, owner_id)
        .await?
        .into_iter()
        .map(PlayerActionLedger::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut players: IndexMap<String, GameStatLine> = game
        .roster()
        .iter()
        .map(|player_id| (player_id.clone(), GameStatLine::empty()))
        .collect();
    for ledger in &ledgers {
        players.insert(ledger.player_id().to_owned(), ledger.stat_line());
    }
    let team_points: u32 = players.values().map(|line| line.total_points).sum();

    debug!(%game_id, owner_id, ledgers = ledgers.len(), "box score computed");
    Ok(BoxScore {
        game_id,
        team_id: game.team_id().to_owned(),
        opponent: game.opponent().to_owned(),
        status: game.status(),
        quarter: game.quarter(),
        team_points,
        opponent_score: game.opponent_score(),
        players,
    })
}
