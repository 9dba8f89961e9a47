//! Refresh orchestration over in-memory collaborators.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wayfinder::{
    ClanSource, DestinyError, DestinyErrorKind, DestinyRefresh, FeedError, FeedErrorKind,
    FeedPost, FeedRepository, FeedSource, FeedSync, InMemoryFeedRepository,
    InMemoryRosterRepository, MessagePublisher, NewFeed, NewPlayer, NewPlayerMetric, Player,
    Refresher, RosterRepository, WayfinderErrorKind, WayfinderResult,
};

const GROUP: i64 = 3760031;
const FISH: i64 = 24768693;

fn pass(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

fn member(membership_id: &str, name: &str) -> NewPlayer {
    NewPlayer {
        display_name: name.to_string(),
        membership_type: 3,
        membership_id: membership_id.to_string(),
        global_display_name: name.to_string(),
        global_display_code: 1,
        group_id: GROUP.to_string(),
        group_join_date: pass(0),
        last_online: pass(0),
    }
}

/// Clan source with a settable roster that reports each player's membership
/// id length as fish progress.
#[derive(Default)]
struct FakeClan {
    roster: Mutex<Vec<NewPlayer>>,
    asked_for: Mutex<Vec<String>>,
    fail_roster: Mutex<bool>,
}

#[async_trait]
impl ClanSource for FakeClan {
    async fn roster(&self, group_id: i64) -> WayfinderResult<Vec<NewPlayer>> {
        assert_eq!(group_id, GROUP);
        if *self.fail_roster.lock().unwrap() {
            return Err(DestinyError::new(DestinyErrorKind::Throttled { attempts: 11 }).into());
        }
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn player_metrics(&self, players: &[Player]) -> WayfinderResult<Vec<NewPlayerMetric>> {
        let mut asked = self.asked_for.lock().unwrap();
        Ok(players
            .iter()
            .map(|p| {
                asked.push(p.membership_id.clone());
                NewPlayerMetric {
                    player_id: p.id,
                    metric_id: FISH,
                    objective_hash: 1365777019,
                    progress: Some(p.display_name.len() as i32),
                    completion_value: 5,
                    complete: p.display_name.len() >= 5,
                    visible: true,
                }
            })
            .collect())
    }
}

struct OnePostSource;

#[async_trait]
impl FeedSource for OnePostSource {
    fn source_name(&self) -> &str {
        "bluesky"
    }

    async fn resolve_author(&self, handle: &str) -> WayfinderResult<String> {
        Ok(format!("did:plc:{handle}"))
    }

    async fn recent_posts(&self, author_id: &str) -> WayfinderResult<Vec<FeedPost>> {
        Ok(vec![FeedPost {
            uri: format!("at://{author_id}/app.bsky.feed.post/3kpost"),
            author_handle: "destinythegame.bungie.net".to_string(),
            text: "Weekly reset".to_string(),
            created_at: Utc::now() - TimeDelta::hours(1),
        }])
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

#[async_trait]
impl MessagePublisher for Outbox {
    async fn publish(&self, channel_id: u64, content: &str) -> WayfinderResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(FeedError::new(FeedErrorKind::Publish {
                channel: channel_id,
                message: "Unknown Channel".to_string(),
            })
            .into());
        }
        self.sent.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

struct Harness {
    clan: Arc<FakeClan>,
    roster: InMemoryRosterRepository,
    feeds: InMemoryFeedRepository,
    outbox: Arc<Outbox>,
    refresher: Refresher,
}

async fn harness() -> Harness {
    let clan = Arc::new(FakeClan::default());
    let roster = InMemoryRosterRepository::new();
    let feeds = InMemoryFeedRepository::new();
    let outbox = Arc::new(Outbox::default());

    feeds
        .add_feed(NewFeed {
            source: "bluesky".to_string(),
            author: "destinythegame.bungie.net".to_string(),
            author_source_id: Some("did:plc:destiny".to_string()),
            last_message: None,
        })
        .await
        .unwrap();

    let refresher = Refresher::new()
        .with_destiny(DestinyRefresh::new(clan.clone(), Arc::new(roster.clone()), GROUP))
        .with_feeds(FeedSync::new(
            Arc::new(feeds.clone()),
            Arc::new(OnePostSource),
            outbox.clone(),
            42,
            Duration::from_secs(60),
        ));

    Harness {
        clan,
        roster,
        feeds,
        outbox,
        refresher,
    }
}

#[tokio::test]
async fn test_both_branches_run() {
    let h = harness().await;
    *h.clan.roster.lock().unwrap() = vec![member("1", "alpha"), member("2", "bo")];

    let report = h.refresher.run().await.into_result().unwrap();

    let destiny = report.destiny.unwrap().unwrap();
    assert_eq!(destiny.players().inserted(), &2);
    assert_eq!(destiny.metrics().inserted(), &2);
    assert_eq!(destiny.metrics().completed(), &1);
    assert_eq!(report.feeds.unwrap().unwrap().published(), &1);
    assert_eq!(h.outbox.sent.lock().unwrap().len(), 1);
    assert_eq!(h.roster.metric_count().await, 2);
}

#[tokio::test]
async fn test_destiny_failure_does_not_stop_feeds() {
    let h = harness().await;
    *h.clan.fail_roster.lock().unwrap() = true;

    let report = h.refresher.run().await;
    assert!(report.destiny.as_ref().unwrap().is_err());
    assert_eq!(report.feeds.as_ref().unwrap().as_ref().unwrap().published(), &1);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].0, "destiny");
    assert_eq!(h.roster.player_count().await, 0);
}

#[tokio::test]
async fn test_failures_from_both_branches_are_aggregated() {
    let h = harness().await;
    *h.clan.fail_roster.lock().unwrap() = true;
    *h.outbox.fail.lock().unwrap() = true;

    let err = h.refresher.run().await.into_result().unwrap_err();
    let branches: Vec<_> = err.failures.iter().map(|(b, _)| b.as_str()).collect();
    assert_eq!(branches, ["destiny", "feed destinythegame.bungie.net"]);
    assert!(err.to_string().contains("Unknown Channel"));

    // The failed publish left the watermark untouched
    let feed = &h.feeds.list_feeds().await.unwrap()[0];
    assert_eq!(feed.last_message, None);
}

#[tokio::test]
async fn test_departed_members_keep_rows_but_skip_metrics() {
    let clan = Arc::new(FakeClan::default());
    let roster = InMemoryRosterRepository::new();
    let destiny = DestinyRefresh::new(clan.clone(), Arc::new(roster.clone()), GROUP);

    *clan.roster.lock().unwrap() = vec![member("1", "alpha"), member("2", "bo")];
    destiny.run_at(pass(1)).await.unwrap();

    *clan.roster.lock().unwrap() = vec![member("1", "alpha")];
    clan.asked_for.lock().unwrap().clear();
    let report = destiny.run_at(pass(2)).await.unwrap();

    assert_eq!(report.members(), &1);
    assert_eq!(clan.asked_for.lock().unwrap().as_slice(), ["1"]);
    let stale = roster.list_stale_players(pass(2)).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].membership_id, "2");
}

#[tokio::test]
async fn test_pass_timestamp_is_shared_by_every_row() {
    let clan = Arc::new(FakeClan::default());
    let roster = InMemoryRosterRepository::new();
    let destiny = DestinyRefresh::new(clan.clone(), Arc::new(roster.clone()), GROUP);
    *clan.roster.lock().unwrap() = vec![member("1", "alpha")];

    destiny.run_at(pass(3)).await.unwrap();

    let player = &roster.list_players().await.unwrap()[0];
    let metric = roster.player_metric(player.id, FISH).await.unwrap().unwrap();
    assert_eq!(player.updated_at, pass(3));
    assert_eq!(metric.updated_at, pass(3));
    assert_eq!(metric.completed_at, Some(pass(3)));
}

#[tokio::test]
async fn test_disabled_branches_are_not_reported() {
    let report = Refresher::new().run().await;
    assert!(report.destiny.is_none());
    assert!(report.feeds.is_none());
    assert!(report.into_result().is_ok());
}

#[tokio::test]
async fn test_branch_error_kind_survives() {
    let h = harness().await;
    *h.clan.fail_roster.lock().unwrap() = true;

    let report = h.refresher.run().await;
    match report.destiny.unwrap().unwrap_err().kind() {
        WayfinderErrorKind::Destiny(e) => {
            assert!(matches!(e.kind, DestinyErrorKind::Throttled { attempts: 11 }))
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// A provider whose connection never answers.
struct StalledSource;

#[async_trait]
impl FeedSource for StalledSource {
    fn source_name(&self) -> &str {
        "bluesky"
    }

    async fn resolve_author(&self, handle: &str) -> WayfinderResult<String> {
        Ok(format!("did:plc:{handle}"))
    }

    async fn recent_posts(&self, _author_id: &str) -> WayfinderResult<Vec<FeedPost>> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_deadline_bounds_stalled_feed_branch() {
    let h = harness().await;
    h.clan.roster.lock().unwrap().push(member("1", "alpha"));
    let cancel = CancellationToken::new();
    let refresher = Refresher::new()
        .with_destiny(DestinyRefresh::new(
            h.clan.clone(),
            Arc::new(h.roster.clone()),
            GROUP,
        ))
        .with_feeds(
            FeedSync::new(
                Arc::new(h.feeds.clone()),
                Arc::new(StalledSource),
                h.outbox.clone(),
                42,
                Duration::from_secs(60),
            )
            .with_cancellation(cancel.clone()),
        );

    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        deadline.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), refresher.run())
        .await
        .expect("refresh should finish once the deadline fires");
    assert!(matches!(report.destiny, Some(Ok(_))));
    let failures = report.into_result().unwrap_err().failures;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "feed destinythegame.bungie.net");
    assert!(failures[0].1.contains("cancelled"));
    assert!(h.outbox.sent.lock().unwrap().is_empty());
}
