//! Process-local storage backend.
//!
//! Each collection lives in its own [`DashMap`]; every write goes through a
//! single commit gate so version checks, cascades and the substitution commit
//! are atomic with respect to each other.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, PlayerStatsEntity, SubstitutionEntity},
        storage::{StorageError, StorageResult},
        store::{GameStore, PlayerStatsStore, SubstitutionStore},
    },
    state::lifecycle::GameStatus,
};

/// In-memory implementation of every storage port.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, GameEntity>,
    substitutions: DashMap<Uuid, SubstitutionEntity>,
    stats: DashMap<Uuid, PlayerStatsEntity>,
    commit_gate: Mutex<()>,
    offline: AtomicBool,
    write_delay_ms: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a lost backend: every call fails with
    /// [`StorageError::Unavailable`] until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Stall every save before its version check, widening the window in
    /// which concurrent writers overlap.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.write_delay_ms.store(millis, Ordering::SeqCst);
    }
}

impl MemoryInner {
    fn ensure_online(&self, operation: &str) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                format!("{operation} failed"),
                io::Error::new(io::ErrorKind::NotConnected, "in-memory store offline"),
            ));
        }
        Ok(())
    }

    async fn stall(&self) {
        let millis = self.write_delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn owned_games(&self, owner_id: &str, filter: impl Fn(&GameEntity) -> bool) -> Vec<GameEntity> {
        let mut games: Vec<GameEntity> = self
            .games
            .iter()
            .filter(|entry| entry.owner_id == owner_id && filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        games
    }

    fn owned_stats(
        &self,
        owner_id: &str,
        filter: impl Fn(&PlayerStatsEntity) -> bool,
    ) -> Vec<PlayerStatsEntity> {
        let mut stats: Vec<PlayerStatsEntity> = self
            .stats
            .iter()
            .filter(|entry| entry.owner_id == owner_id && filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        stats.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        stats
    }

    /// Version-check a game write without applying it.
    fn check_game(&self, game: &GameEntity) -> StorageResult<()> {
        let stored = self
            .games
            .get(&game.id)
            .map(|entry| (entry.owner_id.clone(), entry.version));
        if stored.is_none() && game.version != 0 {
            return Err(StorageError::MissingGame { id: game.id });
        }
        check_version(game.id, &game.owner_id, game.version, stored)
    }

    fn put_game(&self, mut game: GameEntity) -> GameEntity {
        game.version += 1;
        self.games.insert(game.id, game.clone());
        game
    }

    fn cascade_game(&self, game_id: Uuid) {
        self.substitutions.retain(|_, entry| entry.game_id != game_id);
        self.stats.retain(|_, entry| entry.game_id != game_id);
    }
}

fn check_version(
    id: Uuid,
    owner_id: &str,
    version: u64,
    stored: Option<(String, u64)>,
) -> StorageResult<()> {
    match stored {
        Some((stored_owner, _)) if stored_owner != owner_id => {
            Err(StorageError::OwnerMismatch { id })
        }
        Some((_, stored_version)) if stored_version != version => {
            Err(StorageError::VersionConflict {
                id,
                expected: version,
                actual: stored_version,
            })
        }
        None if version != 0 => Err(StorageError::VersionConflict {
            id,
            expected: version,
            actual: 0,
        }),
        _ => Ok(()),
    }
}

impl GameStore for InMemoryStore {
    fn find_game(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("find game")?;
            Ok(inner
                .games
                .get(&id)
                .filter(|entry| entry.owner_id == owner_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_games_by_owner(
        &self,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list games")?;
            Ok(inner.owned_games(&owner_id, |_| true))
        })
    }

    fn list_games_by_team(
        &self,
        team_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        let team_id = team_id.to_owned();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list games by team")?;
            Ok(inner.owned_games(&owner_id, |game| game.team_id == team_id))
        })
    }

    fn list_games_by_status(
        &self,
        status: GameStatus,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list games by status")?;
            Ok(inner.owned_games(&owner_id, |game| game.status == status))
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.ensure_online("save game")?;
            inner.stall().await;
            let _gate = inner.commit_gate.lock().await;
            inner.check_game(&game)?;
            Ok(inner.put_game(game))
        })
    }

    fn save_game_with_substitution(
        &self,
        game: GameEntity,
        substitution: SubstitutionEntity,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.ensure_online("save substitution")?;
            inner.stall().await;
            let _gate = inner.commit_gate.lock().await;

            if substitution.game_id != game.id || substitution.owner_id != game.owner_id {
                return Err(StorageError::OwnerMismatch {
                    id: substitution.id,
                });
            }
            if inner.substitutions.contains_key(&substitution.id) {
                return Err(StorageError::Duplicate {
                    message: format!("substitution `{}` already recorded", substitution.id),
                });
            }
            inner.check_game(&game)?;

            let saved = inner.put_game(game);
            inner.substitutions.insert(substitution.id, substitution);
            Ok(saved)
        })
    }

    fn delete_game(&self, id: Uuid, owner_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("delete game")?;
            let _gate = inner.commit_gate.lock().await;

            let removed = inner
                .games
                .remove_if(&id, |_, game| game.owner_id == owner_id)
                .is_some();
            if removed {
                inner.cascade_game(id);
                debug!(game_id = %id, "deleted game with its substitutions and ledgers");
            }
            Ok(removed)
        })
    }

    fn delete_games_by_owner(&self, owner_id: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("delete games by owner")?;
            let _gate = inner.commit_gate.lock().await;

            let ids: Vec<Uuid> = inner
                .owned_games(&owner_id, |_| true)
                .into_iter()
                .map(|game| game.id)
                .collect();
            for id in &ids {
                inner.games.remove(id);
                inner.cascade_game(*id);
            }
            debug!(owner_id = %owner_id, count = ids.len(), "deleted owner games");
            Ok(ids.len() as u64)
        })
    }
}

impl SubstitutionStore for InMemoryStore {
    fn find_substitution(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<SubstitutionEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("find substitution")?;
            Ok(inner
                .substitutions
                .get(&id)
                .filter(|entry| entry.owner_id == owner_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_substitutions_by_game(
        &self,
        game_id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<SubstitutionEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list substitutions")?;
            let mut entries: Vec<SubstitutionEntity> = inner
                .substitutions
                .iter()
                .filter(|entry| entry.game_id == game_id && entry.owner_id == owner_id)
                .map(|entry| entry.value().clone())
                .collect();
            entries.sort_by(|a, b| {
                a.quarter
                    .cmp(&b.quarter)
                    .then(a.timestamp.cmp(&b.timestamp))
            });
            Ok(entries)
        })
    }

    fn delete_substitutions_by_owner(
        &self,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("delete substitutions by owner")?;
            let _gate = inner.commit_gate.lock().await;

            let before = inner.substitutions.len();
            inner
                .substitutions
                .retain(|_, entry| entry.owner_id != owner_id);
            Ok((before - inner.substitutions.len()) as u64)
        })
    }
}

impl PlayerStatsStore for InMemoryStore {
    fn find_stats(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("find stats")?;
            Ok(inner
                .stats
                .get(&id)
                .filter(|entry| entry.owner_id == owner_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn find_stats_for(
        &self,
        game_id: Uuid,
        player_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerStatsEntity>>> {
        let inner = self.inner.clone();
        let player_id = player_id.to_owned();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("find stats for player")?;
            Ok(inner
                .owned_stats(&owner_id, |stats| {
                    stats.game_id == game_id && stats.player_id == player_id
                })
                .into_iter()
                .next())
        })
    }

    fn list_stats_by_game(
        &self,
        game_id: Uuid,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatsEntity>>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list stats by game")?;
            Ok(inner.owned_stats(&owner_id, |stats| stats.game_id == game_id))
        })
    }

    fn list_stats_by_player(
        &self,
        player_id: &str,
        owner_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerStatsEntity>>> {
        let inner = self.inner.clone();
        let player_id = player_id.to_owned();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("list stats by player")?;
            Ok(inner.owned_stats(&owner_id, |stats| stats.player_id == player_id))
        })
    }

    fn save_stats(
        &self,
        stats: PlayerStatsEntity,
    ) -> BoxFuture<'static, StorageResult<PlayerStatsEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.ensure_online("save stats")?;
            inner.stall().await;
            let _gate = inner.commit_gate.lock().await;

            if !inner
                .games
                .get(&stats.game_id)
                .is_some_and(|game| game.owner_id == stats.owner_id)
            {
                return Err(StorageError::MissingGame { id: stats.game_id });
            }

            let stored = inner
                .stats
                .get(&stats.id)
                .map(|entry| (entry.owner_id.clone(), entry.version));
            let is_new = stored.is_none();
            check_version(stats.id, &stats.owner_id, stats.version, stored)?;

            if is_new
                && inner.stats.iter().any(|entry| {
                    entry.game_id == stats.game_id
                        && entry.player_id == stats.player_id
                        && entry.owner_id == stats.owner_id
                })
            {
                return Err(StorageError::Duplicate {
                    message: format!(
                        "player `{}` already has statistics for game `{}`",
                        stats.player_id, stats.game_id
                    ),
                });
            }

            let mut stats = stats;
            stats.version += 1;
            inner.stats.insert(stats.id, stats.clone());
            Ok(stats)
        })
    }

    fn delete_stats(&self, id: Uuid, owner_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("delete stats")?;
            let _gate = inner.commit_gate.lock().await;
            Ok(inner
                .stats
                .remove_if(&id, |_, stats| stats.owner_id == owner_id)
                .is_some())
        })
    }

    fn delete_stats_by_owner(&self, owner_id: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        let owner_id = owner_id.to_owned();
        Box::pin(async move {
            inner.ensure_online("delete stats by owner")?;
            let _gate = inner.commit_gate.lock().await;

            let before = inner.stats.len();
            inner.stats.retain(|_, entry| entry.owner_id != owner_id);
            Ok((before - inner.stats.len()) as u64)
        })
    }
}
