//! Menu catalog queries.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crustline_core::Price;

use super::{PgBackend, classify};
use crate::db::{CatalogStore, RepositoryError};
use crate::models::{Item, ItemField, ItemFilter, SortKey};

const ITEM_TAKEN: &str = "item already exists";

#[derive(sqlx::FromRow)]
struct ItemRow {
    item_name: String,
    ingredients: Option<String>,
    type_of_item: Option<String>,
    price: Decimal,
    description: Option<String>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for {}: {e}", row.item_name))
        })?;

        Ok(Self {
            name: row.item_name.trim().to_owned(),
            price,
            ingredients: row.ingredients.unwrap_or_default().trim().to_owned(),
            type_of_item: row.type_of_item.unwrap_or_default().trim().to_owned(),
            description: row.description.unwrap_or_default().trim().to_owned(),
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, RepositoryError> {
    rows.into_iter().map(Item::try_from).collect()
}

#[async_trait]
impl CatalogStore for PgBackend {
    async fn list_items(&self, sort: SortKey) -> Result<Vec<Item>, RepositoryError> {
        let sql = match sort {
            SortKey::None => {
                r"
                SELECT itemName AS item_name, ingredients, typeOfItem AS type_of_item,
                       price, description
                FROM Items
                ORDER BY itemName
                "
            }
            SortKey::PriceAsc => {
                r"
                SELECT itemName AS item_name, ingredients, typeOfItem AS type_of_item,
                       price, description
                FROM Items
                ORDER BY price ASC, itemName
                "
            }
            SortKey::PriceDesc => {
                r"
                SELECT itemName AS item_name, ingredients, typeOfItem AS type_of_item,
                       price, description
                FROM Items
                ORDER BY price DESC, itemName
                "
            }
        };

        let rows = sqlx::query_as::<_, ItemRow>(sql)
            .fetch_all(self.pool())
            .await?;
        into_items(rows)
    }

    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT itemName AS item_name, ingredients, typeOfItem AS type_of_item,
                   price, description
            FROM Items
            WHERE LOWER(TRIM(typeOfItem)) = $1
              AND ($2::NUMERIC IS NULL OR price < $2)
            ORDER BY itemName
            ",
        )
        .bind(filter.type_of_item())
        .bind(filter.max_price.map(|p| p.amount()))
        .fetch_all(self.pool())
        .await?;

        into_items(rows)
    }

    async fn get_item(&self, name: &str) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT itemName AS item_name, ingredients, typeOfItem AS type_of_item,
                   price, description
            FROM Items
            WHERE itemName = $1
            ",
        )
        .bind(name.trim())
        .fetch_optional(self.pool())
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn insert_item(&self, item: &Item) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO Items (itemName, ingredients, typeOfItem, price, description)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&item.name)
        .bind(&item.ingredients)
        .bind(&item.type_of_item)
        .bind(item.price.amount())
        .bind(&item.description)
        .execute(self.pool())
        .await
        .map_err(|e| classify(e, ITEM_TAKEN))?;

        Ok(())
    }

    async fn update_item(&self, name: &str, changes: &[ItemField]) -> Result<(), RepositoryError> {
        let name = name.trim();
        let mut tx = self.pool().begin().await?;

        let found: Option<(String,)> =
            sqlx::query_as("SELECT itemName FROM Items WHERE itemName = $1 FOR UPDATE")
                .bind(name)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Err(RepositoryError::NotFound);
        }

        for change in changes {
            let query = match change {
                ItemField::Price(price) => {
                    sqlx::query("UPDATE Items SET price = $2 WHERE itemName = $1")
                        .bind(name)
                        .bind(price.amount())
                }
                ItemField::Ingredients(v) => {
                    sqlx::query("UPDATE Items SET ingredients = $2 WHERE itemName = $1")
                        .bind(name)
                        .bind(v.as_str())
                }
                ItemField::TypeOfItem(v) => {
                    sqlx::query("UPDATE Items SET typeOfItem = $2 WHERE itemName = $1")
                        .bind(name)
                        .bind(v.as_str())
                }
                ItemField::Description(v) => {
                    sqlx::query("UPDATE Items SET description = $2 WHERE itemName = $1")
                        .bind(name)
                        .bind(v.as_str())
                }
            };
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
