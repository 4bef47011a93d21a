//! Order header and line item queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crustline_core::{Login, OrderId, OrderStatus, Quantity, StoreId};

use super::{PgBackend, classify};
use crate::db::{OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderLine, OrderScope};

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_id: OrderId,
    login: String,
    store_id: StoreId,
    total_price: Decimal,
    ordered_at: DateTime<Utc>,
    order_status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.login).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login on order {}: {e}", row.order_id))
        })?;
        let status = row
            .order_status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: row.order_id,
            login,
            store_id: row.store_id,
            total_price: row.total_price,
            ordered_at: row.ordered_at,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    order_id: OrderId,
    item_name: String,
    quantity: i32,
}

impl TryFrom<LineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.order_id))
        })?;

        Ok(Self {
            order_id: row.order_id,
            item_name: row.item_name.trim().to_owned(),
            quantity,
        })
    }
}

const ORDER_COLUMNS: &str = r"
    orderID AS order_id, login, storeID AS store_id, totalPrice AS total_price,
    orderTimestamp AS ordered_at, orderStatus AS order_status
";

#[async_trait]
impl OrderStore for PgBackend {
    async fn reserve_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        // The sequence default hands out the ID inside the insert itself.
        let (id,): (OrderId,) = sqlx::query_as(
            r"
            INSERT INTO FoodOrder (login, storeID, totalPrice, orderTimestamp, orderStatus)
            VALUES ($1, $2, 0, $3, $4)
            RETURNING orderID
            ",
        )
        .bind(&order.login)
        .bind(order.store_id)
        .bind(order.ordered_at)
        .bind(OrderStatus::Incomplete.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| classify(e, "order id already in use"))?;

        Ok(id)
    }

    async fn insert_line(
        &self,
        order_id: OrderId,
        item_name: &str,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO ItemsInOrder (orderID, itemName, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (orderID, itemName)
            DO UPDATE SET quantity = ItemsInOrder.quantity + EXCLUDED.quantity
            ",
        )
        .bind(order_id)
        .bind(item_name)
        .bind(quantity.get())
        .execute(self.pool())
        .await
        .map_err(|e| classify(e, "duplicate order line"))?;

        Ok(())
    }

    async fn set_total(&self, order_id: OrderId, total: Decimal) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE FoodOrder SET totalPrice = $2 WHERE orderID = $1")
            .bind(order_id)
            .bind(total)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE FoodOrder SET orderStatus = $2 WHERE orderID = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_orders(
        &self,
        scope: &OrderScope,
        limit: Option<i64>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let owner = match scope {
            OrderScope::Owner(login) => Some(login),
            OrderScope::All => None,
        };
        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM FoodOrder
            WHERE ($1::TEXT IS NULL OR login = $1)
            ORDER BY orderTimestamp DESC, orderID DESC
            LIMIT $2
            "
        );

        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(owner)
            .bind(limit)
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM FoodOrder WHERE orderID = $1");

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(self.pool())
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn get_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, LineRow>(
            r"
            SELECT orderID AS order_id, itemName AS item_name, quantity
            FROM ItemsInOrder
            WHERE orderID = $1
            ORDER BY itemName
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }
}
