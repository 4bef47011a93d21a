//! Integration tests for Crustline.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios (no database needed)
//! cargo test -p crustline-integration-tests
//!
//! # Include the PostgreSQL suite
//! TEST_DATABASE_URL=postgres://localhost/crustline_test \
//!     cargo test -p crustline-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `ordering` - Placement protocol, totals and concurrent reservation
//! - `accounts` - Registration, authentication and atomic renames
//! - `router` - The role × action table and dispatch
//! - `postgres` - The same properties against a real database (ignored by default)

use std::sync::Arc;

use secrecy::SecretString;

use crustline_backend::db::{self, PgBackend};
use crustline_backend::{BackendConfig, MemoryBackend, Session};
use crustline_core::{Login, Role};

/// Environment variable naming the database the ignored tests use.
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// A shared in-memory store with three stores, six menu items and a
/// `manager`/`manager` account.
#[must_use]
pub fn demo_backend() -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::with_demo_data())
}

/// Add an account to the store and return a session logged in as it.
///
/// # Panics
///
/// Panics if `login` is not a valid login.
#[must_use]
pub fn logged_in(backend: &MemoryBackend, login: &str, role: Role) -> Session {
    let login = Login::parse(login).expect("valid test login");
    backend.add_user(login.clone(), "pw", role);
    let mut session = Session::anonymous();
    session.log_in(login, role);
    session
}

/// Connect to `TEST_DATABASE_URL`, migrate, and empty every table.
///
/// Returns `None` when the variable is unset.
///
/// # Panics
///
/// Panics if the database is unreachable or a statement fails.
pub async fn fresh_postgres() -> Option<PgBackend> {
    let url = std::env::var(TEST_DATABASE_URL).ok()?;
    let config = BackendConfig::from_url(SecretString::from(url)).expect("valid pool settings");
    let pool = db::create_pool(&config).await.expect("connect to test database");
    db::run_migrations(&pool).await.expect("apply migrations");

    sqlx::query("TRUNCATE ItemsInOrder, FoodOrder, Items, Store, Users RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("truncate tables");
    sqlx::query(
        r"
        INSERT INTO Store (storeID, address, city, state)
        VALUES (1, '100 University Ave', 'Riverside', 'CA'),
               (2, '2500 Main St', 'Irvine', 'CA')
        ",
    )
    .execute(&pool)
    .await
    .expect("seed stores");

    Some(PgBackend::new(pool))
}
