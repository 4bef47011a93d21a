//! Interactive terminal session over stdin/stdout.

use std::io;

use crustline_backend::{Backend, BackendConfig, MemoryBackend};

use crate::terminal::Terminal;

/// Run a session against `PostgreSQL`.
///
/// # Errors
///
/// Returns `sqlx::Error` (exit status 1) if the database is unreachable,
/// or an I/O error from the terminal.
pub async fn postgres(config: &BackendConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend = super::connect(config).await?;
    tracing::info!("Connected");
    interact(&backend).await?;
    backend.pool().close().await;
    Ok(())
}

/// Run a session against a seeded in-memory store.
///
/// # Errors
///
/// Returns an I/O error from the terminal.
pub async fn in_memory() -> io::Result<()> {
    tracing::info!("Using in-memory store; log in as manager/manager");
    let backend = MemoryBackend::with_demo_data();
    interact(&backend).await
}

async fn interact(backend: &dyn Backend) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Terminal::new(backend, stdin.lock(), stdout.lock()).run().await
}
