//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! # Using CRUSTLINE_DATABASE_URL (or DATABASE_URL)
//! crustline migrate
//!
//! # Against a local server
//! crustline migrate pizza_db 5432 chef
//! ```
//!
//! Migrations live in `crates/backend/migrations/` and are embedded in the
//! binary at build time.

use thiserror::Error;

use crustline_backend::BackendConfig;
use crustline_backend::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run(config: &BackendConfig) -> Result<(), MigrationError> {
    let backend = super::connect(config).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(backend.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
