//! Connection pooling and migrations.

use crate::DatabaseResult;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument};
use wayfinder_core::DatabaseSettings;
use wayfinder_error::{DatabaseError, DatabaseErrorKind};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Shared PostgreSQL connection pool.
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// A connection checked out of [`DbPool`].
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Read the connection string from `DATABASE_URL`.
///
/// # Errors
///
/// Returns a connection error if the variable is unset.
pub fn database_url() -> DatabaseResult<String> {
    std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })
}

/// Build a pool and check out one connection to prove the database is reachable.
///
/// # Errors
///
/// Returns a connection error if the pool cannot be built or warmed up.
#[instrument(skip(url))]
pub fn establish_pool(url: &str, pool_size: u32) -> DatabaseResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(pool_size.max(1))
        .build(manager)
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Connection(format!(
                "Failed to create connection pool: {e}"
            )))
        })?;

    drop(pool.get()?);
    info!("Database pool ready");
    Ok(pool)
}

/// Build a pool from `DATABASE_URL` and the configured pool size.
///
/// # Errors
///
/// Returns a connection error if the URL is missing or the database is unreachable.
pub fn pool_from_env(settings: &DatabaseSettings) -> DatabaseResult<DbPool> {
    establish_pool(&database_url()?, *settings.pool_size())
}

/// Apply any pending embedded migrations, returning how many ran.
///
/// # Errors
///
/// Returns a migration error if any migration fails.
pub fn run_migrations(conn: &mut PgConnection) -> DatabaseResult<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    for version in &applied {
        info!(%version, "Applied migration");
    }
    Ok(applied.len())
}

/// Run `query` on a pooled connection in the blocking thread pool.
pub(crate) async fn with_connection<T, F>(pool: &DbPool, query: F) -> DatabaseResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        query(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(e.to_string())))?
}
