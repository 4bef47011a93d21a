//! Subcommand implementations.

pub mod migrate;
pub mod shell;
pub mod user;

use crustline_backend::BackendConfig;
use crustline_backend::db::{self, PgBackend};

/// Connect to `PostgreSQL`, logging where (never the URL, which may hold a
/// password).
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be established.
async fn connect(config: &BackendConfig) -> Result<PgBackend, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        "Connecting to database..."
    );
    let pool = db::create_pool(config).await?;
    Ok(PgBackend::new(pool))
}
