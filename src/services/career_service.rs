use tracing::debug;

use crate::{
    error::ServiceError,
    state::{SharedState, career::CareerAggregate, ledger::PlayerActionLedger},
};

/// Career totals, averages and percentages of a player across every game of
/// `owner_id`. A player without any ledger gets a zero-valued aggregate.
pub async fn get_player_aggregate_stats(
    state: &SharedState,
    player_id: &str,
    owner_id: &str,
) -> Result<CareerAggregate, ServiceError> {
    if player_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Player ID is required".into()));
    }

    let ledgers = state
        .store()
        .list_stats_by_player(player_id, owner_id)
        .await?
        .into_iter()
        .map(PlayerActionLedger::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let aggregate = CareerAggregate::from_ledgers(player_id, &ledgers);
    debug!(
        player_id,
        owner_id,
        games_played = aggregate.games_played,
        "career aggregate computed"
    );
    Ok(aggregate)
}
