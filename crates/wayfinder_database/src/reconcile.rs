//! Stage-then-merge bulk reconciliation.
//!
//! Each pass runs in one transaction:
//!
//! 1. create a temporary staging table shaped like the target (`ON COMMIT DROP`)
//! 2. bulk insert the snapshot into it in chunks
//! 3. count staged rows that already exist, then `MERGE` staging into the target
//! 4. for metrics only, stamp `completed_at` on rows complete for the first time
//!
//! Any failure rolls the whole pass back. The returned error names the
//! failing step and carries both its cause and the rollback outcome.

use crate::DatabaseResult;
use crate::models::{StagedMetric, StagedPlayer};
use crate::schema::{player_metric, player_metric_staging, player_staging};
use chrono::{DateTime, Utc};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Timestamptz};
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, error, info, instrument};
use wayfinder_core::{NewPlayer, NewPlayerMetric, ReconcileSummary};
use wayfinder_error::{DatabaseError, DatabaseErrorKind};

/// Rows per staging insert, well under PostgreSQL's bind parameter limit.
const STAGE_CHUNK: usize = 1000;

const CREATE_PLAYER_STAGING: &str =
    "CREATE TEMP TABLE player_staging ON COMMIT DROP AS TABLE player WITH NO DATA";

const COUNT_PLAYER_MATCHES: &str = "SELECT COUNT(*) AS count FROM player_staging s \
     JOIN player t ON t.membership_id = s.membership_id";

const MERGE_PLAYERS: &str = "MERGE INTO player AS t \
     USING player_staging AS s ON t.membership_id = s.membership_id \
     WHEN MATCHED THEN UPDATE SET \
         display_name = s.display_name, \
         membership_type = s.membership_type, \
         global_display_name = s.global_display_name, \
         global_display_code = s.global_display_code, \
         group_id = s.group_id, \
         group_join_date = s.group_join_date, \
         last_online = s.last_online, \
         updated_at = $1 \
     WHEN NOT MATCHED THEN INSERT ( \
         display_name, membership_type, membership_id, global_display_name, \
         global_display_code, group_id, group_join_date, last_online, updated_at, created_at \
     ) VALUES ( \
         s.display_name, s.membership_type, s.membership_id, s.global_display_name, \
         s.global_display_code, s.group_id, s.group_join_date, s.last_online, $1, $1 \
     )";

const CREATE_METRIC_STAGING: &str =
    "CREATE TEMP TABLE player_metric_staging ON COMMIT DROP AS TABLE player_metric WITH NO DATA";

const COUNT_METRIC_MATCHES: &str = "SELECT COUNT(*) AS count FROM player_metric_staging s \
     JOIN player_metric t ON t.player_id = s.player_id AND t.metric_id = s.metric_id";

const MERGE_METRICS: &str = "MERGE INTO player_metric AS t \
     USING player_metric_staging AS s ON t.player_id = s.player_id AND t.metric_id = s.metric_id \
     WHEN MATCHED THEN UPDATE SET \
         objective_hash = s.objective_hash, \
         progress = s.progress, \
         completion_value = s.completion_value, \
         complete = s.complete, \
         visible = s.visible, \
         updated_at = $1 \
     WHEN NOT MATCHED THEN INSERT ( \
         player_id, metric_id, objective_hash, progress, completion_value, \
         complete, visible, updated_at, created_at \
     ) VALUES ( \
         s.player_id, s.metric_id, s.objective_hash, s.progress, s.completion_value, \
         s.complete, s.visible, $1, $1 \
     )";

/// Steps of a reconcile pass, named in transaction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileStep {
    /// Opening the transaction
    Begin,
    /// Creating and filling the staging table
    Stage,
    /// Merging staging into the target table
    Merge,
    /// Stamping first completion times
    Complete,
    /// Committing the transaction
    Commit,
}

impl ReconcileStep {
    /// Lowercase step name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStep::Begin => "begin",
            ReconcileStep::Stage => "stage",
            ReconcileStep::Merge => "merge",
            ReconcileStep::Complete => "complete",
            ReconcileStep::Commit => "commit",
        }
    }
}

impl std::fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the error reported when a step fails.
#[track_caller]
pub fn transaction_error(
    step: ReconcileStep,
    cause: impl ToString,
    rollback: Option<String>,
) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::Transaction {
        step: step.to_string(),
        cause: cause.to_string(),
        rollback,
    })
}

/// Drop earlier rows that share a key with a later row, keeping order.
pub fn dedupe_last_wins<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = rows
        .into_iter()
        .rev()
        .filter(|row| seen.insert(key(row)))
        .collect();
    kept.reverse();
    kept
}

/// Failure of one step inside the transaction.
struct StepFailure {
    step: ReconcileStep,
    cause: diesel::result::Error,
}

trait AtStep<T> {
    fn at(self, step: ReconcileStep) -> Result<T, StepFailure>;
}

impl<T> AtStep<T> for QueryResult<T> {
    fn at(self, step: ReconcileStep) -> Result<T, StepFailure> {
        self.map_err(|cause| StepFailure { step, cause })
    }
}

#[derive(QueryableByName)]
struct MatchCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Run `body` in a transaction, joining any rollback failure with the cause.
fn in_transaction<T>(
    conn: &mut PgConnection,
    body: impl FnOnce(&mut PgConnection) -> Result<T, StepFailure>,
) -> DatabaseResult<T> {
    AnsiTransactionManager::begin_transaction(conn)
        .map_err(|e| transaction_error(ReconcileStep::Begin, e, None))?;

    match body(conn) {
        Ok(value) => match AnsiTransactionManager::commit_transaction(conn) {
            Ok(()) => Ok(value),
            // A failed commit is rolled back by the transaction manager itself
            Err(diesel::result::Error::RollbackErrorOnCommit {
                rollback_error,
                commit_error,
            }) => Err(transaction_error(
                ReconcileStep::Commit,
                commit_error,
                Some(rollback_error.to_string()),
            )),
            Err(e) => Err(transaction_error(ReconcileStep::Commit, e, None)),
        },
        Err(StepFailure { step, cause }) => {
            let rollback = AnsiTransactionManager::rollback_transaction(conn)
                .err()
                .map(|e| e.to_string());
            error!(%step, %cause, ?rollback, "Reconcile step failed, rolled back");
            Err(transaction_error(step, cause, rollback))
        }
    }
}

fn count_matches(conn: &mut PgConnection, query: &str) -> QueryResult<usize> {
    let row: MatchCount = diesel::sql_query(query).get_result(conn)?;
    Ok(usize::try_from(row.count).unwrap_or_default())
}

/// Reconcile a full roster snapshot keyed by membership id.
///
/// # Errors
///
/// Returns a transaction error naming the failed step; nothing is written.
#[instrument(skip(conn, snapshot), fields(rows = snapshot.len()))]
pub fn reconcile_players(
    conn: &mut PgConnection,
    snapshot: Vec<NewPlayer>,
    pass_started: DateTime<Utc>,
) -> DatabaseResult<ReconcileSummary> {
    let snapshot = dedupe_last_wins(snapshot, |p| p.membership_id.clone());
    let staged: Vec<StagedPlayer<'_>> = snapshot.iter().map(StagedPlayer::from).collect();

    let summary = in_transaction(conn, |conn| {
        diesel::sql_query(CREATE_PLAYER_STAGING)
            .execute(conn)
            .at(ReconcileStep::Stage)?;
        for chunk in staged.chunks(STAGE_CHUNK) {
            diesel::insert_into(player_staging::table)
                .values(chunk)
                .execute(conn)
                .at(ReconcileStep::Stage)?;
        }
        debug!(staged = staged.len(), "Staged players");

        let updated = count_matches(conn, COUNT_PLAYER_MATCHES).at(ReconcileStep::Merge)?;
        diesel::sql_query(MERGE_PLAYERS)
            .bind::<Timestamptz, _>(pass_started)
            .execute(conn)
            .at(ReconcileStep::Merge)?;

        Ok(ReconcileSummary::new(staged.len().saturating_sub(updated), updated, 0))
    })?;

    info!(inserted = summary.inserted(), updated = summary.updated(), "Reconciled players");
    Ok(summary)
}

/// Reconcile a full metric snapshot keyed by `(player_id, metric_id)`, then
/// stamp `completed_at` on complete rows that have none yet.
///
/// # Errors
///
/// Returns a transaction error naming the failed step; nothing is written.
#[instrument(skip(conn, snapshot), fields(rows = snapshot.len()))]
pub fn reconcile_metrics(
    conn: &mut PgConnection,
    snapshot: Vec<NewPlayerMetric>,
    pass_started: DateTime<Utc>,
) -> DatabaseResult<ReconcileSummary> {
    let snapshot = dedupe_last_wins(snapshot, NewPlayerMetric::key);
    let staged: Vec<StagedMetric> = snapshot.iter().map(StagedMetric::from).collect();

    let summary = in_transaction(conn, |conn| {
        diesel::sql_query(CREATE_METRIC_STAGING)
            .execute(conn)
            .at(ReconcileStep::Stage)?;
        for chunk in staged.chunks(STAGE_CHUNK) {
            diesel::insert_into(player_metric_staging::table)
                .values(chunk)
                .execute(conn)
                .at(ReconcileStep::Stage)?;
        }
        debug!(staged = staged.len(), "Staged player metrics");

        let updated = count_matches(conn, COUNT_METRIC_MATCHES).at(ReconcileStep::Merge)?;
        diesel::sql_query(MERGE_METRICS)
            .bind::<Timestamptz, _>(pass_started)
            .execute(conn)
            .at(ReconcileStep::Merge)?;

        let completed = diesel::update(
            player_metric::table
                .filter(player_metric::completed_at.is_null())
                .filter(player_metric::complete.eq(true)),
        )
        .set(player_metric::completed_at.eq(Some(pass_started)))
        .execute(conn)
        .at(ReconcileStep::Complete)?;

        Ok(ReconcileSummary::new(staged.len().saturating_sub(updated), updated, completed))
    })?;

    info!(
        inserted = summary.inserted(),
        updated = summary.updated(),
        completed = summary.completed(),
        "Reconciled player metrics"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_last_wins() {
        let rows = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let kept = dedupe_last_wins(rows, |(k, _)| *k);
        assert_eq!(kept, vec![("a", 3), ("c", 4), ("b", 5)]);
    }

    #[test]
    fn test_dedupe_without_duplicates() {
        let rows = vec![1, 2, 3];
        assert_eq!(dedupe_last_wins(rows, |n| *n), vec![1, 2, 3]);
    }

    #[test]
    fn test_transaction_error_joins_rollback() {
        let err = transaction_error(
            ReconcileStep::Merge,
            "insert or update violates foreign key constraint",
            Some("connection reset".to_string()),
        );
        let text = err.to_string();
        assert!(text.contains("merge"));
        assert!(text.contains("foreign key"));
        assert!(text.contains("connection reset"));
    }
}
