//! Backing-store access for the order backend.
//!
//! # Tables
//!
//! - `Users` - Accounts, credentials and roles
//! - `Items` - Menu catalog
//! - `Store` - Store locations (reference data)
//! - `FoodOrder` - Order headers
//! - `ItemsInOrder` - Order line items
//!
//! Two implementations sit behind the [`Backend`] trait:
//! [`PgBackend`] for `PostgreSQL` and [`MemoryBackend`] for tests and demos.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/backend/migrations/` and run via:
//! ```bash
//! cargo run -p crustline-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crustline_core::{Login, OrderId, OrderStatus, Password, Quantity, Role, StoreId};

use crate::config::BackendConfig;
use crate::models::{
    Item, ItemField, ItemFilter, NewOrder, NewUser, Order, OrderLine, OrderScope, SortKey, Store,
    User, UserField,
};

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate login).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the login is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<(), RepositoryError>;

    /// Role of the account whose login and password both match exactly.
    async fn find_role(
        &self,
        login: &Login,
        password: &Password,
    ) -> Result<Option<Role>, RepositoryError>;

    async fn get_user(&self, login: &Login) -> Result<Option<User>, RepositoryError>;

    /// Apply a batch of field changes to one account, all or nothing.
    ///
    /// A rename also rewrites the login on every order that references the
    /// account. Returns `RepositoryError::NotFound` if the account does not
    /// exist and `RepositoryError::Conflict` if the new login is taken.
    async fn update_user(&self, login: &Login, changes: &[UserField])
    -> Result<(), RepositoryError>;
}

/// Menu catalog storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_items(&self, sort: SortKey) -> Result<Vec<Item>, RepositoryError>;

    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError>;

    async fn get_item(&self, name: &str) -> Result<Option<Item>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the name is taken.
    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError>;

    /// Apply a batch of field changes, all or nothing.
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    async fn update_item(&self, name: &str, changes: &[ItemField]) -> Result<(), RepositoryError>;
}

/// Store reference data.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;

    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError>;
}

/// Order header and line item storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Allocate a fresh order ID and insert its header (total 0, status
    /// `incomplete`) as one indivisible step.
    ///
    /// Concurrent callers always receive distinct IDs. Returns
    /// `RepositoryError::NotFound` if the store or login does not exist.
    async fn reserve_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Persist a line item. Adding an item already on the order adds to its
    /// quantity.
    async fn insert_line(
        &self,
        order_id: OrderId,
        item_name: &str,
        quantity: Quantity,
    ) -> Result<(), RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the order does not exist.
    async fn set_total(&self, order_id: OrderId, total: Decimal) -> Result<(), RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the order does not exist.
    async fn set_status(&self, order_id: OrderId, status: OrderStatus)
    -> Result<(), RepositoryError>;

    /// Orders in scope, newest first.
    async fn list_orders(
        &self,
        scope: &OrderScope,
        limit: Option<i64>,
    ) -> Result<Vec<Order>, RepositoryError>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Line items of an order, by item name.
    async fn get_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;
}

/// The complete backing store.
pub trait Backend: UserStore + CatalogStore + StoreDirectory + OrderStore {}

impl<T> Backend for T where T: UserStore + CatalogStore + StoreDirectory + OrderStore {}

/// Create a `PostgreSQL` connection pool from configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &BackendConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Run the embedded schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Default acquire timeout used when none is configured.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
