#![allow(dead_code)]

use std::sync::Arc;

use courtside_back::{
    config::{AppConfig, WriteMode},
    dao::store::InMemoryStore,
    dto::game::{CreateGameRequest, SetLineupRequest, SetRosterRequest},
    services::game_service,
    state::{AppState, SharedState},
    telemetry,
};
use rstest::fixture;
use serde_json::json;
use uuid::Uuid;

pub const OWNER: &str = "u1";
pub const OTHER_OWNER: &str = "u2";

pub struct Harness {
    pub state: SharedState,
    pub store: InMemoryStore,
}

impl Harness {
    pub fn new(write_mode: WriteMode) -> Self {
        let _ = telemetry::init_tracing("warn");
        let store = InMemoryStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            AppConfig::default().with_write_mode(write_mode),
        );
        Self { state, store }
    }
}

#[fixture]
pub fn harness() -> Harness {
    Harness::new(WriteMode::Serialized)
}

pub fn players(from: usize, to: usize) -> Vec<String> {
    (from..=to).map(|n| format!("p{n}")).collect()
}

pub fn create_request(team_id: &str, opponent: &str) -> CreateGameRequest {
    serde_json::from_value(json!({ "team_id": team_id, "opponent": opponent })).unwrap()
}

/// Game with roster p1..p8 and starting five p1..p5, not started.
pub async fn ready_game(state: &SharedState, owner_id: &str) -> Uuid {
    let game = game_service::create_game(state, owner_id, create_request("t1", "Tigers"))
        .await
        .unwrap();
    game_service::set_roster(
        state,
        game.id,
        owner_id,
        SetRosterRequest {
            player_ids: players(1, 8),
        },
    )
    .await
    .unwrap();
    game_service::set_starting_lineup(
        state,
        game.id,
        owner_id,
        SetLineupRequest {
            player_ids: players(1, 5),
        },
    )
    .await
    .unwrap();
    game.id
}

/// Same as [`ready_game`], already started.
pub async fn live_game(state: &SharedState, owner_id: &str) -> Uuid {
    let id = ready_game(state, owner_id).await;
    game_service::start_game(state, id, owner_id).await.unwrap();
    id
}
