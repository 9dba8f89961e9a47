//! Reconcile behavior of the in-memory roster repository.

use chrono::{DateTime, Duration, TimeZone, Utc};
use wayfinder_core::{NewPlayer, NewPlayerMetric, NewPlayerMetricBuilder};
use wayfinder_database::{InMemoryRosterRepository, ReconcileStep};
use wayfinder_error::{DatabaseErrorKind, WayfinderErrorKind};
use wayfinder_interface::RosterRepository;

const FISH: i64 = 24768693;

fn pass(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

fn player(membership_id: &str, name: &str) -> NewPlayer {
    NewPlayer {
        display_name: name.to_string(),
        membership_type: 3,
        membership_id: membership_id.to_string(),
        global_display_name: name.to_string(),
        global_display_code: 1234,
        group_id: "3760031".to_string(),
        group_join_date: Utc.with_ymd_and_hms(2023, 1, 22, 23, 28, 29).unwrap(),
        last_online: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
}

fn metric(player_id: i64, metric_id: i64, progress: i32, complete: bool) -> NewPlayerMetric {
    NewPlayerMetricBuilder::default()
        .player_id(player_id)
        .metric_id(metric_id)
        .objective_hash(1365777019)
        .progress(Some(progress))
        .completion_value(100)
        .complete(complete)
        .build()
        .unwrap()
}

fn transaction_step(err: &wayfinder_error::WayfinderError) -> Option<String> {
    match err.kind() {
        WayfinderErrorKind::Database(e) => match &e.kind {
            DatabaseErrorKind::Transaction { step, .. } => Some(step.clone()),
            _ => None,
        },
        _ => None,
    }
}

#[tokio::test]
async fn test_first_pass_inserts_with_pass_timestamps() {
    let repo = InMemoryRosterRepository::new();

    let summary = repo
        .reconcile_players(vec![player("1", "alpha"), player("2", "bravo")], pass(1))
        .await
        .unwrap();
    assert_eq!(summary.inserted(), &2);
    assert_eq!(summary.updated(), &0);

    let players = repo.list_players().await.unwrap();
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p.created_at == pass(1) && p.updated_at == pass(1)));
}

#[tokio::test]
async fn test_second_pass_updates_in_place() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();

    let summary = repo
        .reconcile_players(vec![player("1", "alpha-renamed")], pass(2))
        .await
        .unwrap();
    assert_eq!(summary.updated(), &1);
    assert_eq!(summary.inserted(), &0);

    let players = repo.list_players().await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].display_name, "alpha-renamed");
    assert_eq!(players[0].created_at, pass(1));
    assert_eq!(players[0].updated_at, pass(2));
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let repo = InMemoryRosterRepository::new();
    let snapshot = vec![player("1", "alpha"), player("2", "bravo")];
    repo.reconcile_players(snapshot.clone(), pass(1)).await.unwrap();
    let first = repo.list_players().await.unwrap();

    repo.reconcile_players(snapshot, pass(1)).await.unwrap();
    assert_eq!(repo.list_players().await.unwrap(), first);
}

#[tokio::test]
async fn test_duplicate_keys_last_wins() {
    let repo = InMemoryRosterRepository::new();
    let summary = repo
        .reconcile_players(
            vec![player("1", "first"), player("2", "bravo"), player("1", "second")],
            pass(1),
        )
        .await
        .unwrap();

    assert_eq!(summary.inserted(), &2);
    let names: Vec<_> = repo
        .list_players()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.display_name)
        .collect();
    assert_eq!(names, vec!["bravo", "second"]);
}

#[tokio::test]
async fn test_absent_players_are_kept_and_reported_stale() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha"), player("2", "bravo")], pass(1))
        .await
        .unwrap();
    repo.reconcile_players(vec![player("1", "alpha")], pass(2))
        .await
        .unwrap();

    assert_eq!(repo.player_count().await, 2);
    let stale = repo.list_stale_players(pass(2)).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].membership_id, "2");
}

#[tokio::test]
async fn test_completion_is_stamped_once() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();
    let id = repo.list_players().await.unwrap()[0].id;

    repo.reconcile_metrics(vec![metric(id, FISH, 10, false)], pass(1))
        .await
        .unwrap();
    assert_eq!(
        repo.player_metric(id, FISH).await.unwrap().unwrap().completed_at,
        None
    );

    let summary = repo
        .reconcile_metrics(vec![metric(id, FISH, 100, true)], pass(2))
        .await
        .unwrap();
    assert_eq!(summary.completed(), &1);
    assert_eq!(
        repo.player_metric(id, FISH).await.unwrap().unwrap().completed_at,
        Some(pass(2))
    );

    // A later glitch reporting incomplete never clears or moves the stamp
    repo.reconcile_metrics(vec![metric(id, FISH, 90, false)], pass(3))
        .await
        .unwrap();
    let summary = repo
        .reconcile_metrics(vec![metric(id, FISH, 100, true)], pass(4))
        .await
        .unwrap();
    assert_eq!(summary.completed(), &0);

    let stored = repo.player_metric(id, FISH).await.unwrap().unwrap();
    assert_eq!(stored.completed_at, Some(pass(2)));
    assert_eq!(stored.created_at, pass(1));
    assert_eq!(stored.updated_at, pass(4));
}

#[tokio::test]
async fn test_completed_on_first_sighting() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();
    let id = repo.list_players().await.unwrap()[0].id;

    repo.reconcile_metrics(vec![metric(id, FISH, 100, true)], pass(1))
        .await
        .unwrap();
    let stored = repo.player_metric(id, FISH).await.unwrap().unwrap();
    assert_eq!(stored.completed_at, Some(pass(1)));
}

#[tokio::test]
async fn test_failed_merge_leaves_state_untouched() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();
    let before = repo.list_players().await.unwrap();

    repo.fail_at(ReconcileStep::Merge).await;
    let err = repo
        .reconcile_players(vec![player("1", "renamed"), player("2", "bravo")], pass(2))
        .await
        .unwrap_err();

    assert_eq!(transaction_step(&err).as_deref(), Some("merge"));
    assert_eq!(repo.list_players().await.unwrap(), before);
}

#[tokio::test]
async fn test_failed_completion_stamp_rolls_back_merge() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();
    let id = repo.list_players().await.unwrap()[0].id;
    repo.reconcile_metrics(vec![metric(id, FISH, 10, false)], pass(1))
        .await
        .unwrap();

    repo.fail_at(ReconcileStep::Complete).await;
    let err = repo
        .reconcile_metrics(vec![metric(id, FISH, 100, true)], pass(2))
        .await
        .unwrap_err();
    assert_eq!(transaction_step(&err).as_deref(), Some("complete"));

    let stored = repo.player_metric(id, FISH).await.unwrap().unwrap();
    assert_eq!(stored.progress, Some(10));
    assert!(!stored.complete);
    assert_eq!(stored.updated_at, pass(1));
}

#[tokio::test]
async fn test_metrics_for_unknown_player_fail_whole_pass() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha")], pass(1))
        .await
        .unwrap();
    let id = repo.list_players().await.unwrap()[0].id;

    let err = repo
        .reconcile_metrics(
            vec![metric(id, FISH, 10, false), metric(id + 100, FISH, 5, false)],
            pass(1),
        )
        .await
        .unwrap_err();
    assert_eq!(transaction_step(&err).as_deref(), Some("merge"));
    assert_eq!(repo.metric_count().await, 0);
}

#[tokio::test]
async fn test_metric_rows_for_leaderboard() {
    let repo = InMemoryRosterRepository::new();
    repo.reconcile_players(vec![player("1", "alpha"), player("2", "bravo")], pass(1))
        .await
        .unwrap();
    let ids: Vec<i64> = repo.list_players().await.unwrap().iter().map(|p| p.id).collect();

    repo.reconcile_metrics(
        vec![
            metric(ids[0], FISH, 12, false),
            metric(ids[1], FISH, 40, false),
            metric(ids[1], 1, 1, true),
        ],
        pass(1),
    )
    .await
    .unwrap();

    let rows = repo.metric_rows(FISH).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(repo.player_metrics(ids[1]).await.unwrap().len(), 2);
    assert!(
        repo.list_stale_players(pass(1) + Duration::hours(1))
            .await
            .unwrap()
            .len()
            == 2
    );
}
