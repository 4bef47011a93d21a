//! Order header and line item types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crustline_core::{Login, OrderId, OrderStatus, Quantity, StoreId};

/// An order header (`FoodOrder` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Owning customer.
    pub login: Login,
    pub store_id: StoreId,
    /// Sum of line totals, written once when placement commits.
    pub total_price: Decimal,
    /// Set at creation, never changed.
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// One (item, quantity) pairing within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub item_name: String,
    pub quantity: Quantity,
}

/// An order header together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Parameters for reserving a new order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub login: Login,
    pub store_id: StoreId,
    pub ordered_at: DateTime<Utc>,
}

/// Which orders a query may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Only orders owned by this login.
    Owner(Login),
    /// Every order (staff and managers).
    All,
}

impl OrderScope {
    /// Whether an order falls within the scope.
    #[must_use]
    pub fn includes(&self, order: &Order) -> bool {
        match self {
            Self::Owner(login) => &order.login == login,
            Self::All => true,
        }
    }
}
