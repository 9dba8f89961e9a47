//! PostgreSQL persistence for the Wayfinder sync pipeline.
//!
//! This crate owns the Diesel schema and embedded migrations, the
//! stage-then-merge reconcile engine, and repository implementations for the
//! roster and feed seams of `wayfinder_interface`.
//!
//! # Example
//!
//! ```no_run
//! use wayfinder_core::DatabaseSettings;
//! use wayfinder_database::{PostgresRosterRepository, pool_from_env, run_migrations};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = pool_from_env(&DatabaseSettings::default())?;
//! run_migrations(&mut *pool.get()?)?;
//! let repo = PostgresRosterRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod feed_repository;
mod in_memory;
mod models;
mod reconcile;
mod roster_repository;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{
    DbConnection, DbPool, database_url, establish_pool, pool_from_env, run_migrations,
};
pub use feed_repository::PostgresFeedRepository;
pub use in_memory::{InMemoryFeedRepository, InMemoryRosterRepository};
pub use reconcile::{
    ReconcileStep, dedupe_last_wins, reconcile_metrics, reconcile_players, transaction_error,
};
pub use roster_repository::PostgresRosterRepository;

use wayfinder_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
