pub mod memory;

use crate::dao::models::{GameEntity, PlayerStatsEntity, SubstitutionEntity};
use crate::dao::storage::StorageResult;
use crate::state::lifecycle::GameStatus;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use self::memory::InMemoryStore;

/// Persistence port for games. Every lookup is scoped by owner; an entity of
/// another owner is reported as absent.
///
/// Saves are version checked: the entity must carry the version currently
/// stored (`0` for a new entity) and is returned with the bumped version.
pub trait GameStore: Send + Sync {
    /// Fetch one game.
    fn find_game(&self, id: Uuid, owner_id: &str)
    -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// All games of an owner, oldest first.
    fn list_games_by_owner(
        &self,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Games of one team.
    fn list_games_by_team(
        &self,
        team_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Games in one status.
    fn list_games_by_status(
        &self,
        status: GameStatus,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Upsert a game.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Upsert a game and append its substitution record in one atomic step.
    fn save_game_with_substitution(
        &self,
        game: GameEntity,
        substitution: SubstitutionEntity,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Delete a game with its substitutions and ledgers.
    fn delete_game(&self, id: Uuid, owner_id: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete every game of an owner (cascading), returning how many games went.
    fn delete_games_by_owner(&self, owner_id: &str) -> BoxFuture<'static, StorageResult<u64>>;
}

/// Read side of the substitution ledger. Writes go through
/// [`GameStore::save_game_with_substitution`].
pub trait SubstitutionStore: Send + Sync {
    /// Fetch one substitution.
    fn find_substitution(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<SubstitutionEntity>>>;
    /// Substitutions of a game ordered by quarter then timestamp.
    fn list_substitutions_by_game(
        &self,
        game_id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SubstitutionEntity>>>;
    /// Drop every substitution of an owner.
    fn delete_substitutions_by_owner(&self, owner_id: &str)
    -> BoxFuture<'static, StorageResult<u64>>;
}

/// Persistence port for player statistics ledgers. At most one ledger exists
/// per (game, player, owner).
pub trait PlayerStatsStore: Send + Sync {
    /// Fetch one ledger by id.
    fn find_stats(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>>;
    /// Fetch the ledger of a player in a game.
    fn find_stats_for(
        &self,
        game_id: Uuid,
        player_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>>;
    /// Ledgers of one game.
    fn list_stats_by_game(
        &self,
        game_id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatsEntity>>>;
    /// Ledgers of one player across games.
    fn list_stats_by_player(
        &self,
        player_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatsEntity>>>;
    /// Upsert a ledger. Fails with [`StorageError::MissingGame`] unless its game
    /// is stored for the same owner at commit time.
    ///
    /// [`StorageError::MissingGame`]: crate::dao::storage::StorageError::MissingGame
    fn save_stats(&self, stats: PlayerStatsEntity)
    -> BoxFuture<'static, StorageResult<PlayerStatsEntity>>;
    /// Delete one ledger.
    fn delete_stats(&self, id: Uuid, owner_id: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop every ledger of an owner.
    fn delete_stats_by_owner(&self, owner_id: &str) -> BoxFuture<'static, StorageResult<u64>>;
}

/// Every port a use-case may need, behind one handle.
pub trait Storage: GameStore + SubstitutionStore + PlayerStatsStore {}

impl<T> Storage for T where T: GameStore + SubstitutionStore + PlayerStatsStore {}
