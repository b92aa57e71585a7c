pub mod career;
pub mod error;
pub mod game;
pub mod ledger;
pub mod lifecycle;
pub mod substitution;

use std::{hash::Hash, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::{AppConfig, WriteMode},
    dao::store::Storage,
    telemetry,
};

/// Shared handle passed to every use-case.
pub type SharedState = Arc<AppState>;

/// Held for the duration of one load-mutate-save; `None` in optimistic mode,
/// where the store's version check alone guards the write.
pub type WriteGuard = Option<OwnedMutexGuard<()>>;

type LockTable<K> = DashMap<K, Arc<Mutex<()>>>;

/// Central application state: storage handle, configuration and the per-key
/// write locks serializing concurrent mutations of one game or one ledger.
pub struct AppState {
    store: Arc<dyn Storage>,
    config: AppConfig,
    game_locks: LockTable<Uuid>,
    ledger_locks: LockTable<(Uuid, String)>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn Storage>, config: AppConfig) -> SharedState {
        Arc::new(Self {
            store,
            config,
            game_locks: DashMap::new(),
            ledger_locks: DashMap::new(),
        })
    }

    /// Load [`AppConfig`] from disk, install the tracing subscriber with its
    /// log filter and build the state around `store`.
    pub fn bootstrap(store: Arc<dyn Storage>) -> SharedState {
        let config = AppConfig::load();
        if let Err(err) = telemetry::init_tracing(config.log_filter()) {
            debug!(error = %err, "tracing subscriber already installed");
        }
        info!(write_mode = ?config.write_mode(), "application state ready");
        Self::new(store, config)
    }

    /// Storage backend.
    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.store
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serialize writers of one game.
    pub async fn lock_game(&self, game_id: Uuid) -> WriteGuard {
        self.acquire(&self.game_locks, game_id).await
    }

    /// Serialize writers of one (game, player) ledger.
    pub async fn lock_ledger(&self, game_id: Uuid, player_id: &str) -> WriteGuard {
        self.acquire(&self.ledger_locks, (game_id, player_id.to_owned()))
            .await
    }

    /// Drop the lock entries of a deleted game.
    pub fn forget_game(&self, game_id: Uuid) {
        self.game_locks.remove(&game_id);
        self.ledger_locks.retain(|(id, _), _| *id != game_id);
    }

    async fn acquire<K>(&self, table: &LockTable<K>, key: K) -> WriteGuard
    where
        K: Eq + Hash,
    {
        if self.config.write_mode() == WriteMode::Optimistic {
            return None;
        }
        let lock = table.entry(key).or_default().clone();
        Some(lock.lock_owned().await)
    }
}
