mod common;

use std::time::Duration;

use courtside_back::{
    config::WriteMode,
    dto::{
        common::Outcome,
        game::{SetLineupRequest, SetRosterRequest, SubstitutionRequest, UpdateGameRequest},
        stats::{AddMinutesRequest, RecordActionRequest},
    },
    error::ServiceError,
    services::{career_service, game_service, stats_service},
    state::{ledger::ActionKind, lifecycle::GameStatus},
};
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use common::{Harness, OTHER_OWNER, OWNER, create_request, harness, live_game, players};

fn action(player_id: &str, kind: ActionKind, made: Option<bool>) -> RecordActionRequest {
    RecordActionRequest {
        player_id: player_id.into(),
        kind,
        made,
    }
}

fn minutes(player_id: &str, minutes: u32) -> AddMinutesRequest {
    AddMinutesRequest {
        player_id: player_id.into(),
        minutes,
    }
}

#[rstest]
#[tokio::test]
async fn tigers_scenario(harness: Harness) {
    let state = &harness.state;
    let game = game_service::create_game(state, OWNER, create_request("t1", "Tigers"))
        .await
        .unwrap();
    game_service::set_roster(
        state,
        game.id,
        OWNER,
        SetRosterRequest {
            player_ids: players(1, 5),
        },
    )
    .await
    .unwrap();
    game_service::set_starting_lineup(
        state,
        game.id,
        OWNER,
        SetLineupRequest {
            player_ids: players(1, 5),
        },
    )
    .await
    .unwrap();

    let err = game_service::substitute_player(
        state,
        game.id,
        OWNER,
        SubstitutionRequest {
            player_out: "p1".into(),
            player_in: "p2".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let started = game_service::start_game(state, game.id, OWNER).await.unwrap();
    assert_eq!(started.status, GameStatus::InProgress);
    assert_eq!(started.status.as_str(), "in_progress");
    assert_eq!(started.quarter, 1);

    let err = stats_service::undo_last_action(state, game.id, OWNER, "p1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No actions to undo");

    let stats = stats_service::record_action(
        state,
        game.id,
        OWNER,
        action("p1", ActionKind::TwoPoint, Some(true)),
    )
    .await
    .unwrap();
    assert_eq!(stats.stats.counters.two_points_made, 1);
    assert_eq!(stats.stats.total_points, 2);

    let undone = stats_service::undo_last_action(state, game.id, OWNER, "p1")
        .await
        .unwrap();
    assert_eq!(undone.undone.kind, ActionKind::TwoPoint);
    assert_eq!(undone.stats.stats.total_points, 0);
    assert_eq!(undone.stats.actions_recorded, 0);
}

#[rstest]
#[tokio::test]
async fn every_kind_round_trips_through_storage(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;
    stats_service::record_action(state, id, OWNER, action("p3", ActionKind::Assist, None))
        .await
        .unwrap();
    let baseline = stats_service::get_player_game_stats(state, id, OWNER, "p3")
        .await
        .unwrap();

    for kind in ActionKind::ALL {
        let outcomes: &[Option<bool>] = if kind.is_shot() {
            &[Some(true), Some(false)]
        } else {
            &[None]
        };
        for &made in outcomes {
            let recorded = stats_service::record_action(state, id, OWNER, action("p3", kind, made))
                .await
                .unwrap();
            assert_ne!(recorded.stats, baseline.stats, "{kind} changed nothing");

            let undone = stats_service::undo_last_action(state, id, OWNER, "p3")
                .await
                .unwrap();
            assert_eq!(undone.stats.stats, baseline.stats, "{kind} made={made:?}");
        }
    }
}

#[rstest]
#[tokio::test]
async fn record_guards(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    let err = stats_service::record_action(state, id, OWNER, action("p42", ActionKind::Steal, None))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Player p42 is not in the roster");

    let shot = action("p1", ActionKind::FreeThrow, None);
    let err = stats_service::record_action(state, id, OWNER, shot)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(err.to_string(), "Shot result is required for free_throw");

    let err = stats_service::record_action(state, id, OWNER, action(" ", ActionKind::Block, None))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Player ID is required");

    let err = stats_service::record_action(
        state,
        Uuid::new_v4(),
        OWNER,
        action("p1", ActionKind::Block, None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let block = action("p1", ActionKind::Block, None);
    let err = stats_service::record_action(state, id, OTHER_OWNER, block)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stats = stats_service::get_player_game_stats(state, id, OWNER, "p1")
        .await
        .unwrap();
    assert_eq!(stats.ledger_id, None);
    assert_eq!(stats.actions_recorded, 0);
}

#[rstest]
#[tokio::test]
async fn minutes_accumulate_outside_undo_history(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    stats_service::add_minutes(state, id, OWNER, minutes("p2", 12))
        .await
        .unwrap();
    stats_service::record_action(state, id, OWNER, action("p2", ActionKind::Turnover, None))
        .await
        .unwrap();
    let stats = stats_service::add_minutes(state, id, OWNER, minutes("p2", 8))
        .await
        .unwrap();
    assert_eq!(stats.stats.minutes_played, 20);
    assert_eq!(stats.actions_recorded, 1);

    let undone = stats_service::undo_last_action(state, id, OWNER, "p2")
        .await
        .unwrap();
    assert_eq!(undone.undone.kind, ActionKind::Turnover);
    assert_eq!(undone.stats.stats.minutes_played, 20);

    let err = stats_service::undo_last_action(state, id, OWNER, "p2")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No actions to undo");

    let err = stats_service::add_minutes(state, id, OWNER, minutes("p2", 0))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Minutes must be between 1 and 60");
}

#[rstest]
#[tokio::test]
async fn box_score_follows_roster_order(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    for request in [
        action("p4", ActionKind::ThreePoint, Some(true)),
        action("p4", ActionKind::FreeThrow, Some(false)),
        action("p1", ActionKind::TwoPoint, Some(true)),
        action("p1", ActionKind::DefensiveRebound, None),
        action("p7", ActionKind::FreeThrow, Some(true)),
    ] {
        stats_service::record_action(state, id, OWNER, request)
            .await
            .unwrap();
    }
    let request: UpdateGameRequest =
        serde_json::from_value(json!({ "opponent_score": 4 })).unwrap();
    game_service::update_game(state, id, OWNER, request)
        .await
        .unwrap();

    let box_score = stats_service::get_game_box_score(state, id, OWNER)
        .await
        .unwrap();
    assert_eq!(
        box_score.players.keys().cloned().collect::<Vec<_>>(),
        players(1, 8)
    );
    assert_eq!(box_score.players["p1"].total_points, 2);
    assert_eq!(box_score.players["p1"].total_rebounds, 1);
    assert_eq!(box_score.players["p4"].total_points, 3);
    assert_eq!(box_score.players["p4"].free_throw_percentage, 0.0);
    assert_eq!(box_score.players["p7"].total_points, 1);
    assert_eq!(box_score.players["p8"].total_points, 0);
    assert_eq!(box_score.team_points, 6);
    assert_eq!(box_score.opponent_score, Some(4));
    assert_eq!(box_score.opponent, "Tigers");
}

#[rstest]
#[tokio::test]
async fn career_without_games_is_zero(harness: Harness) {
    let outcome = Outcome::from(
        career_service::get_player_aggregate_stats(&harness.state, "p1", OWNER).await,
    );
    assert!(outcome.success);

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["data"]["games_played"], json!(0));
    assert_eq!(value["data"]["total_points"], json!(0));
    assert_eq!(value["data"]["average_points"], json!(0.0));
    assert_eq!(value["data"]["field_goal_percentage"], json!(0.0));
}

#[rstest]
#[tokio::test]
async fn career_sums_attempts_across_games(harness: Harness) {
    let state = &harness.state;
    let first = live_game(state, OWNER).await;
    let second = live_game(state, OWNER).await;
    let foreign = live_game(state, OTHER_OWNER).await;

    for request in [
        action("p1", ActionKind::TwoPoint, Some(true)),
        action("p1", ActionKind::TwoPoint, Some(false)),
        action("p1", ActionKind::ThreePoint, Some(true)),
        action("p1", ActionKind::FreeThrow, Some(true)),
        action("p1", ActionKind::Assist, None),
    ] {
        stats_service::record_action(state, first, OWNER, request)
            .await
            .unwrap();
    }
    stats_service::add_minutes(state, first, OWNER, minutes("p1", 10))
        .await
        .unwrap();

    for request in [
        action("p1", ActionKind::ThreePoint, Some(false)),
        action("p1", ActionKind::ThreePoint, Some(false)),
        action("p1", ActionKind::TwoPoint, Some(true)),
        action("p1", ActionKind::Steal, None),
        action("p1", ActionKind::DefensiveRebound, None),
    ] {
        stats_service::record_action(state, second, OWNER, request)
            .await
            .unwrap();
    }
    stats_service::add_minutes(state, second, OWNER, minutes("p1", 15))
        .await
        .unwrap();

    stats_service::record_action(
        state,
        foreign,
        OTHER_OWNER,
        action("p1", ActionKind::ThreePoint, Some(true)),
    )
    .await
    .unwrap();

    let career = career_service::get_player_aggregate_stats(state, "p1", OWNER)
        .await
        .unwrap();
    assert_eq!(career.games_played, 2);
    assert_eq!(career.total_points, 8);
    assert_eq!(career.average_points, 4.0);
    assert_eq!(career.total_rebounds, 1);
    assert_eq!(career.average_rebounds, 0.5);
    assert_eq!(career.total_assists, 1);
    assert_eq!(career.total_steals, 1);
    assert_eq!(career.total_minutes, 25);
    assert_eq!(career.average_minutes, 12.5);
    assert_eq!(career.field_goal_percentage, 50.0);
    assert_eq!(career.three_point_percentage, 33.3);
    assert_eq!(career.free_throw_percentage, 100.0);

    let err = career_service::get_player_aggregate_stats(state, "", OWNER)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Player ID is required");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_records_are_never_lost_when_serialized() {
    let harness = Harness::new(WriteMode::Serialized);
    let id = live_game(&harness.state, OWNER).await;
    harness.store.set_write_delay(Duration::from_millis(2));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let state = harness.state.clone();
            tokio::spawn(async move {
                stats_service::record_action(
                    &state,
                    id,
                    OWNER,
                    action("p5", ActionKind::FreeThrow, Some(true)),
                )
                .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stats = stats_service::get_player_game_stats(&harness.state, id, OWNER, "p5")
        .await
        .unwrap();
    assert_eq!(stats.actions_recorded, 16);
    assert_eq!(stats.stats.counters.free_throws_attempted, 16);
    assert_eq!(stats.stats.total_points, 16);
}

#[tokio::test]
async fn overlapping_records_conflict_when_optimistic() {
    let harness = Harness::new(WriteMode::Optimistic);
    let state = &harness.state;
    let id = live_game(state, OWNER).await;
    stats_service::record_action(state, id, OWNER, action("p5", ActionKind::Block, None))
        .await
        .unwrap();

    harness.store.set_write_delay(Duration::from_millis(20));
    let (first, second) = tokio::join!(
        stats_service::record_action(state, id, OWNER, action("p5", ActionKind::Steal, None)),
        stats_service::record_action(state, id, OWNER, action("p5", ActionKind::Assist, None)),
    );
    harness.store.set_write_delay(Duration::ZERO);

    assert!(first.is_ok() ^ second.is_ok(), "exactly one write should win");
    let err = first.err().or(second.err()).unwrap();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let stats = stats_service::get_player_game_stats(state, id, OWNER, "p5")
        .await
        .unwrap();
    assert_eq!(stats.actions_recorded, 2);
}

#[rstest]
#[tokio::test]
async fn ledger_write_racing_a_game_delete_leaves_nothing_behind(harness: Harness) {
    let state = &harness.state;
    let id = live_game(state, OWNER).await;

    harness.store.set_write_delay(Duration::from_millis(50));
    let (recorded, deleted) = tokio::join!(
        stats_service::record_action(
            state,
            id,
            OWNER,
            action("p1", ActionKind::ThreePoint, Some(true)),
        ),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            game_service::delete_game(state, id, OWNER).await
        },
    );
    harness.store.set_write_delay(Duration::ZERO);

    deleted.unwrap();
    let err = recorded.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "Match not found");

    let career = career_service::get_player_aggregate_stats(state, "p1", OWNER)
        .await
        .unwrap();
    assert_eq!(career.games_played, 0);
    assert_eq!(career.total_points, 0);
}
