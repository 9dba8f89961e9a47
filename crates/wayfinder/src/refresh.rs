//! Refresh orchestration.
//!
//! A refresh forks into two branches that share nothing: the Destiny branch
//! (roster, players, metrics) and the feed branch (mirror every tracked
//! feed). Both run to completion; a failure in one is logged and reported
//! but never cancels the other.

use chrono::{DateTime, SubsecRound, Utc};
use derive_getters::Getters;
use std::sync::Arc;
use tracing::{error, info, instrument};
use wayfinder_core::ReconcileSummary;
use wayfinder_error::{RefreshError, WayfinderResult};
use wayfinder_interface::{ClanSource, RosterRepository};
use wayfinder_social::{FeedSync, FeedSyncReport};

/// Counts from one Destiny branch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct DestinyRefreshReport {
    /// Player reconcile counts
    players: ReconcileSummary,
    /// Metric reconcile counts
    metrics: ReconcileSummary,
    /// Roster members whose metrics were fetched
    members: usize,
}

/// Roster and metric sync for one clan.
#[derive(Clone)]
pub struct DestinyRefresh {
    clan: Arc<dyn ClanSource>,
    roster: Arc<dyn RosterRepository>,
    group_id: i64,
}

impl std::fmt::Debug for DestinyRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinyRefresh")
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

impl DestinyRefresh {
    /// Wire the branch from its collaborators.
    pub fn new(clan: Arc<dyn ClanSource>, roster: Arc<dyn RosterRepository>, group_id: i64) -> Self {
        Self {
            clan,
            roster,
            group_id,
        }
    }

    /// Fetch and reconcile the roster, then the current members' metrics.
    ///
    /// Every row written by this run carries the same pass timestamp, taken
    /// before the first request.
    #[instrument(skip(self), fields(group_id = self.group_id))]
    pub async fn run(&self) -> WayfinderResult<DestinyRefreshReport> {
        self.run_at(pass_timestamp()).await
    }

    /// As [`run`](Self::run), with an explicit pass timestamp.
    pub async fn run_at(&self, pass_started: DateTime<Utc>) -> WayfinderResult<DestinyRefreshReport> {
        info!("Gathering clan roster");
        let snapshot = self.clan.roster(self.group_id).await?;

        info!(members = snapshot.len(), "Reconciling players");
        let players = self.roster.reconcile_players(snapshot, pass_started).await?;

        // Departed members keep their rows but their metrics are not refreshed
        let current: Vec<_> = self
            .roster
            .list_players()
            .await?
            .into_iter()
            .filter(|p| p.updated_at >= pass_started)
            .collect();

        info!(members = current.len(), "Gathering player metrics");
        let snapshot = self.clan.player_metrics(&current).await?;

        info!(rows = snapshot.len(), "Reconciling player metrics");
        let metrics = self.roster.reconcile_metrics(snapshot, pass_started).await?;

        Ok(DestinyRefreshReport {
            players,
            metrics,
            members: current.len(),
        })
    }
}

/// Start of a pass, truncated to the microsecond precision the database keeps.
fn pass_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Outcome of one refresh, per branch. `None` means the branch was not run.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Destiny branch result
    pub destiny: Option<WayfinderResult<DestinyRefreshReport>>,
    /// Feed branch result
    pub feeds: Option<WayfinderResult<FeedSyncReport>>,
}

impl RefreshReport {
    /// `(branch, error)` for everything that failed, including individual feeds.
    pub fn failures(&self) -> Vec<(String, String)> {
        let mut failures = Vec::new();
        if let Some(Err(e)) = &self.destiny {
            failures.push(("destiny".to_string(), e.to_string()));
        }
        match &self.feeds {
            Some(Err(e)) => failures.push(("feeds".to_string(), e.to_string())),
            Some(Ok(report)) => failures.extend(
                report
                    .failures()
                    .iter()
                    .map(|(author, e)| (format!("feed {author}"), e.clone())),
            ),
            None => {}
        }
        failures
    }

    /// `Ok` only when every branch that ran succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`RefreshError`] naming every failed branch and feed.
    pub fn into_result(self) -> Result<Self, RefreshError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(RefreshError::new(failures))
        }
    }
}

/// Runs the Destiny and feed branches side by side.
#[derive(Debug, Clone, Default)]
pub struct Refresher {
    destiny: Option<DestinyRefresh>,
    feeds: Option<FeedSync>,
}

impl Refresher {
    /// A refresher with no branches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the Destiny branch.
    pub fn with_destiny(mut self, destiny: DestinyRefresh) -> Self {
        self.destiny = Some(destiny);
        self
    }

    /// Enable the feed branch.
    pub fn with_feeds(mut self, feeds: FeedSync) -> Self {
        self.feeds = Some(feeds);
        self
    }

    /// Run every enabled branch concurrently and wait for both.
    #[instrument(skip(self), fields(destiny = self.destiny.is_some(), feeds = self.feeds.is_some()))]
    pub async fn run(&self) -> RefreshReport {
        let destiny = async {
            let branch = self.destiny.as_ref()?;
            info!("Starting Destiny refresh");
            let result = branch.run().await;
            match &result {
                Ok(report) => info!(
                    players = report.players.total(),
                    metrics = report.metrics.total(),
                    completed = report.metrics.completed(),
                    "Destiny refresh complete"
                ),
                Err(e) => error!(error = %e, "Destiny refresh failed"),
            }
            Some(result)
        };

        let feeds = async {
            let branch = self.feeds.as_ref()?;
            info!("Starting feed refresh");
            let result = branch.sync_all().await;
            match &result {
                Ok(report) => info!(
                    published = report.published(),
                    failed = report.failures().len(),
                    "Feed refresh complete"
                ),
                Err(e) => error!(error = %e, "Feed refresh failed"),
            }
            Some(result)
        };

        let (destiny, feeds) = tokio::join!(destiny, feeds);
        RefreshReport { destiny, feeds }
    }
}
