mod common;

use std::{sync::Arc, time::Duration};

use courtside_back::{
    config::WriteMode,
    dao::store::InMemoryStore,
    dto::{
        common::Outcome,
        game::{
            ListGamesQuery, SetLineupRequest, SetRosterRequest, SubstitutionRequest,
            UpdateGameRequest,
        },
        stats::RecordActionRequest,
    },
    error::ServiceError,
    services::{career_service, game_service, stats_service},
    state::{AppState, ledger::ActionKind, lifecycle::GameStatus},
};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use common::{Harness, OTHER_OWNER, OWNER, create_request, harness, live_game, players, ready_game};

fn swap(out: &str, player_in: &str) -> SubstitutionRequest {
    SubstitutionRequest {
        player_out: out.into(),
        player_in: player_in.into(),
    }
}

#[rstest]
#[tokio::test]
async fn create_then_fetch(harness: Harness) {
    let created = game_service::create_game(&harness.state, OWNER, create_request("t1", "Tigers"))
        .await
        .unwrap();
    assert_eq!(created.status, GameStatus::NotStarted);
    assert_eq!(created.quarter, 1);
    assert!(!created.can_start);

    let fetched = game_service::get_game(&harness.state, created.id, OWNER)
        .await
        .unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.opponent, "Tigers");
}

#[rstest]
#[case(json!({ "opponent": "  " }), "Opponent is required")]
#[case(json!({ "team_id": "" }), "Team ID is required")]
#[case(json!({ "status": "paused" }), "Invalid match status: paused")]
#[case(json!({ "scheduled_at": "soon" }), "Invalid timestamp: soon")]
#[case(json!({ "roster": ["p1", " "] }), "Player IDs must not be blank")]
#[tokio::test]
async fn create_rejects_bad_input(
    harness: Harness,
    #[case] overrides: serde_json::Value,
    #[case] message: &str,
) {
    let mut payload = json!({ "team_id": "t1", "opponent": "Tigers" });
    for (key, value) in overrides.as_object().unwrap() {
        payload[key.as_str()] = value.clone();
    }
    let request = serde_json::from_value(payload).unwrap();
    let err = game_service::create_game(&harness.state, OWNER, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(err.to_string(), message);
}

#[rstest]
#[tokio::test]
async fn create_requires_an_owner(harness: Harness) {
    let err = game_service::create_game(&harness.state, " ", create_request("t1", "Tigers"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Owner ID is required");
}

#[rstest]
#[tokio::test]
async fn lifecycle_runs_through_four_quarters(harness: Harness) {
    let state = &harness.state;
    let created = game_service::create_game(state, OWNER, create_request("t1", "Tigers"))
        .await
        .unwrap();

    let err = game_service::start_game(state, created.id, OWNER)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Roster and starting lineup must be set before starting"
    );
    let err = game_service::next_quarter(state, created.id, OWNER)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Match must be in progress");

    let id = ready_game(state, OWNER).await;
    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert!(game.can_start);
    assert_eq!(game.current_lineup, game.starting_lineup);

    let game = game_service::start_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.status, GameStatus::InProgress);
    assert_eq!(game.quarter, 1);
    assert!(game.started_at.is_some());

    for expected in 2..=4 {
        let game = game_service::next_quarter(state, id, OWNER).await.unwrap();
        assert_eq!(game.quarter, expected);
    }
    let err = game_service::next_quarter(state, id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(err.to_string(), "Already at last quarter");

    let game = game_service::complete_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.status, GameStatus::Completed);
    assert!(game.completed_at.is_some());

    let err = game_service::start_game(state, id, OWNER).await.unwrap_err();
    assert_eq!(err.to_string(), "Match is already in progress or completed");
    let err = game_service::complete_game(state, id, OWNER)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Match must be in progress to complete");
}

#[rstest]
#[tokio::test]
async fn roster_and_lineup_lock_once_live(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    let err = game_service::set_roster(
        state,
        id,
        OWNER,
        SetRosterRequest {
            player_ids: players(1, 10),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Roster can only be changed before the match starts"
    );

    let err = game_service::set_starting_lineup(
        state,
        id,
        OWNER,
        SetLineupRequest {
            player_ids: players(2, 6),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Starting lineup can only be changed before the match starts"
    );
}

#[rstest]
#[tokio::test]
async fn substitutions_swap_in_place_and_are_logged(harness: Harness) {
    let state = &harness.state;
    let id = ready_game(state, OWNER).await;

    let err = game_service::substitute_player(state, id, OWNER, swap("p1", "p6"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Substitutions are only allowed while the match is in progress"
    );

    game_service::start_game(state, id, OWNER).await.unwrap();
    let outcome = game_service::substitute_player(state, id, OWNER, swap("p2", "p6"))
        .await
        .unwrap();
    assert_eq!(outcome.game.current_lineup, vec!["p1", "p6", "p3", "p4", "p5"]);
    assert_eq!(outcome.substitution.quarter, 1);

    game_service::next_quarter(state, id, OWNER).await.unwrap();
    game_service::substitute_player(state, id, OWNER, swap("p6", "p2"))
        .await
        .unwrap();

    for (request, message) in [
        (swap("p7", "p8"), "Player p7 is not in the current lineup"),
        (swap("p1", "p42"), "Player p42 is not in the roster"),
        (swap("p1", "p3"), "Player p3 is already in the current lineup"),
    ] {
        let err = game_service::substitute_player(state, id, OWNER, request)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    let log = game_service::list_substitutions(state, id, OWNER)
        .await
        .unwrap();
    let entries: Vec<(u8, &str, &str)> = log
        .iter()
        .map(|entry| (entry.quarter, entry.player_out.as_str(), entry.player_in.as_str()))
        .collect();
    assert_eq!(entries, vec![(1, "p2", "p6"), (2, "p6", "p2")]);
}

#[rstest]
#[tokio::test]
async fn unavailable_store_leaves_lineup_untouched(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    harness.store.set_offline(true);
    let err = game_service::substitute_player(state, id, OWNER, swap("p1", "p6"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    harness.store.set_offline(false);

    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.current_lineup, players(1, 5));
    assert!(
        game_service::list_substitutions(state, id, OWNER)
            .await
            .unwrap()
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn games_are_invisible_to_other_owners(harness: Harness) {
    let state = &harness.state;
    let id = ready_game(state, OWNER).await;

    let err = game_service::get_game(state, id, OTHER_OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "Match not found");

    assert!(
        game_service::start_game(state, id, OTHER_OWNER)
            .await
            .is_err()
    );
    assert!(
        game_service::list_games(state, OTHER_OWNER, ListGamesQuery::default())
            .await
            .unwrap()
            .is_empty()
    );
    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.status, GameStatus::NotStarted);
}

#[rstest]
#[tokio::test]
async fn update_patches_whitelisted_fields(harness: Harness) {
    let state = &harness.state;
    let id = ready_game(state, OWNER).await;

    let request: UpdateGameRequest = serde_json::from_value(json!({
        "opponent": "Lions",
        "location": "North gym",
        "scheduled_at": "2025-03-01T18:30:00Z",
        "opponent_score": 61,
    }))
    .unwrap();
    let game = game_service::update_game(state, id, OWNER, request)
        .await
        .unwrap();
    assert_eq!(game.opponent, "Lions");
    assert_eq!(game.location.as_deref(), Some("North gym"));
    assert_eq!(game.scheduled_at.as_deref(), Some("2025-03-01T18:30:00Z"));
    assert_eq!(game.opponent_score, Some(61));

    let request: UpdateGameRequest =
        serde_json::from_value(json!({ "location": null, "opponent": "" })).unwrap();
    let err = game_service::update_game(state, id, OWNER, request)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Opponent is required");
    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.location.as_deref(), Some("North gym"));

    let request: UpdateGameRequest = serde_json::from_value(json!({ "location": null })).unwrap();
    let game = game_service::update_game(state, id, OWNER, request)
        .await
        .unwrap();
    assert_eq!(game.location, None);
    assert_eq!(game.opponent, "Lions");
}

#[rstest]
#[tokio::test]
async fn list_filters_by_team_and_status(harness: Harness) {
    let state = &harness.state;
    let live = live_game(state, OWNER).await;
    let pending = ready_game(state, OWNER).await;
    game_service::create_game(state, OWNER, create_request("t2", "Bears"))
        .await
        .unwrap();

    let all = game_service::list_games(state, OWNER, ListGamesQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let query = ListGamesQuery {
        status: Some("in_progress".into()),
        ..ListGamesQuery::default()
    };
    let in_progress = game_service::list_games(state, OWNER, query).await.unwrap();
    assert_eq!(in_progress.iter().map(|g| g.id).collect::<Vec<_>>(), vec![live]);

    let query = ListGamesQuery {
        team_id: Some("t1".into()),
        status: Some("not_started".into()),
    };
    let t1_pending = game_service::list_games(state, OWNER, query).await.unwrap();
    assert_eq!(t1_pending.iter().map(|g| g.id).collect::<Vec<_>>(), vec![pending]);

    let query = ListGamesQuery {
        status: Some("halftime".into()),
        ..ListGamesQuery::default()
    };
    let err = game_service::list_games(state, OWNER, query)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid match status: halftime");
}

#[rstest]
#[tokio::test]
async fn deleting_a_game_removes_its_history(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;
    game_service::substitute_player(state, id, OWNER, swap("p1", "p6"))
        .await
        .unwrap();
    stats_service::record_action(
        state,
        id,
        OWNER,
        RecordActionRequest {
            player_id: "p6".into(),
            kind: ActionKind::ThreePoint,
            made: Some(true),
        },
    )
    .await
    .unwrap();

    game_service::delete_game(state, id, OWNER).await.unwrap();

    let err = game_service::get_game(state, id, OWNER).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = game_service::delete_game(state, id, OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let career = career_service::get_player_aggregate_stats(state, "p6", OWNER)
        .await
        .unwrap();
    assert_eq!(career.games_played, 0);
    assert_eq!(career.total_points, 0);
}

#[rstest]
#[tokio::test]
async fn owner_purge_reports_what_went(harness: Harness) {
    let state = &harness.state;
    let first = live_game(state, OWNER).await;
    ready_game(state, OWNER).await;
    let kept = ready_game(state, OTHER_OWNER).await;

    game_service::substitute_player(state, first, OWNER, swap("p5", "p8"))
        .await
        .unwrap();
    for player_id in ["p1", "p8"] {
        stats_service::record_action(
            state,
            first,
            OWNER,
            RecordActionRequest {
                player_id: player_id.into(),
                kind: ActionKind::Steal,
                made: None,
            },
        )
        .await
        .unwrap();
    }

    let summary = game_service::delete_owner_data(state, OWNER).await.unwrap();
    assert_eq!(
        (summary.games, summary.substitutions, summary.player_stats),
        (2, 1, 2)
    );

    let outcome = Outcome::from(
        game_service::list_games(state, OWNER, ListGamesQuery::default()).await,
    );
    assert!(outcome.success);
    assert_eq!(outcome.data.map(|games| games.len()), Some(0));
    assert!(game_service::get_game(state, kept, OTHER_OWNER).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn unknown_game_is_not_found(harness: Harness) {
    let outcome = Outcome::from(
        game_service::start_game(&harness.state, Uuid::new_v4(), OWNER).await,
    );
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Match not found"));
}

#[tokio::test]
async fn racing_substitutions_commit_once_in_optimistic_mode() {
    let harness = Harness::new(WriteMode::Optimistic);
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    harness.store.set_write_delay(Duration::from_millis(20));
    let (first, second) = tokio::join!(
        game_service::substitute_player(state, id, OWNER, swap("p1", "p6")),
        game_service::substitute_player(state, id, OWNER, swap("p2", "p7")),
    );
    harness.store.set_write_delay(Duration::ZERO);

    assert!(first.is_ok() ^ second.is_ok(), "exactly one commit should win");
    let err = first.err().or(second.err()).unwrap();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let log = game_service::list_substitutions(state, id, OWNER)
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert!(game.current_lineup.contains(&log[0].player_in));
    assert!(!game.current_lineup.contains(&log[0].player_out));
}

#[rstest]
#[tokio::test]
async fn racing_substitutions_queue_in_serialized_mode(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    harness.store.set_write_delay(Duration::from_millis(20));
    let (first, second) = tokio::join!(
        game_service::substitute_player(state, id, OWNER, swap("p1", "p6")),
        game_service::substitute_player(state, id, OWNER, swap("p2", "p7")),
    );
    harness.store.set_write_delay(Duration::ZERO);

    assert!(first.is_ok() && second.is_ok());
    let game = game_service::get_game(state, id, OWNER).await.unwrap();
    assert_eq!(game.current_lineup, vec!["p6", "p7", "p3", "p4", "p5"]);
    assert_eq!(
        game_service::list_substitutions(state, id, OWNER)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn bootstrapped_state_serves_requests() {
    let state = AppState::bootstrap(Arc::new(InMemoryStore::new()));
    assert_eq!(state.config().write_mode(), WriteMode::Serialized);

    let id = ready_game(&state, OWNER).await;
    let game = game_service::start_game(&state, id, OWNER).await.unwrap();
    assert_eq!(game.quarter, 1);
}
