//! `PostgreSQL` implementation of the backing store.
//!
//! Queries are checked at runtime (`sqlx::query` / `sqlx::query_as`) and
//! every value is a bound parameter. Identifiers are unquoted, so the
//! camel-cased column names in the SQL fold to lower case; row structs
//! alias them to snake case.

mod items;
mod orders;
mod stores;
mod users;

use sqlx::PgPool;

use super::RepositoryError;

/// Backing store over a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map constraint violations to repository errors.
///
/// Unique violations become `Conflict`, foreign-key violations become
/// `NotFound` (the referenced row is missing); everything else stays a
/// database error.
fn classify(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}
