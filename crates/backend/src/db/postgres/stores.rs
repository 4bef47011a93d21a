//! Store reference queries.

use async_trait::async_trait;

use crustline_core::StoreId;

use super::PgBackend;
use crate::db::{RepositoryError, StoreDirectory};
use crate::models::Store;

#[derive(sqlx::FromRow)]
struct StoreRow {
    store_id: i32,
    address: String,
    city: String,
    state: String,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.store_id),
            address: row.address.trim().to_owned(),
            city: row.city.trim().to_owned(),
            state: row.state.trim().to_owned(),
        }
    }
}

#[async_trait]
impl StoreDirectory for PgBackend {
    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT storeID AS store_id, address, city, state
            FROM Store
            ORDER BY storeID
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM Store WHERE storeID = $1)")
                .bind(id)
                .fetch_one(self.pool())
                .await?;

        Ok(row.0)
    }
}
