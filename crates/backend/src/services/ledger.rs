//! Order ledger: the placement protocol and order queries.
//!
//! Placing an order is three steps:
//!
//! 1. [`OrderLedger::begin_order`] reserves a fresh order ID and writes the
//!    header with a zero total and status `incomplete`.
//! 2. [`OrderLedger::add_line`] prices an item from the catalog, persists
//!    the line immediately, and adds to the draft's running total.
//! 3. [`OrderLedger::commit_order`] writes the running total to the header.
//!
//! The header total stays zero until commit, so readers see either the
//! unpriced header or the final total, never a partial sum. A draft that
//! is dropped before commit leaves the header at zero with whatever lines
//! were added.

use chrono::Utc;
use rust_decimal::Decimal;

use crustline_core::{OrderId, OrderStatus, Price, Quantity, Role, StoreId};

use crate::db::{Backend, RepositoryError};
use crate::error::{CoreError, Result};
use crate::models::{NewOrder, Order, OrderDetail, OrderLine};
use crate::router::Action;
use crate::services::catalog::Catalog;
use crate::session::{Identity, Session};

/// How many orders the "recent orders" view shows.
pub const RECENT_ORDER_LIMIT: i64 = 5;

/// Where an uncommitted order is in the placement protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Header reserved, no lines yet.
    Draft,
    /// At least one line priced and persisted.
    Priced,
}

/// An order being placed. Owned by the one session placing it.
#[derive(Debug)]
pub struct OrderDraft {
    id: OrderId,
    store_id: StoreId,
    running_total: Decimal,
    lines: Vec<OrderLine>,
    state: DraftState,
}

impl OrderDraft {
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    #[must_use]
    pub const fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Sum of `quantity × price` over the lines added so far.
    #[must_use]
    pub const fn running_total(&self) -> Decimal {
        self.running_total
    }

    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    #[must_use]
    pub const fn state(&self) -> DraftState {
        self.state
    }

    /// The running total and the item's line quantity after adding
    /// `quantity` units at `price`. Leaves the draft untouched.
    fn after_adding(
        &self,
        item_name: &str,
        price: Price,
        quantity: Quantity,
    ) -> Result<(Decimal, Quantity)> {
        let total = price
            .times(quantity)
            .and_then(|line_total| self.running_total.checked_add(line_total))
            .filter(|total| *total <= Price::MAX.amount())
            .ok_or(CoreError::TotalTooLarge)?;

        let on_order = self
            .lines
            .iter()
            .find(|line| line.item_name == item_name)
            .map_or(0, |line| line.quantity.get());
        let combined = on_order
            .checked_add(quantity.get())
            .and_then(|n| Quantity::new(n).ok())
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "quantity of {item_name} on one order cannot exceed {}",
                    i32::MAX
                ))
            })?;

        Ok((total, combined))
    }

    fn record(&mut self, item_name: &str, combined: Quantity, total: Decimal) {
        self.running_total = total;
        self.state = DraftState::Priced;

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_name == item_name) {
            line.quantity = combined;
        } else {
            self.lines.push(OrderLine {
                order_id: self.id,
                item_name: item_name.to_owned(),
                quantity: combined,
            });
        }
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub store_id: StoreId,
    pub total: Decimal,
    pub lines: Vec<OrderLine>,
    /// Always `incomplete` ("awaiting fulfillment") right after commit.
    pub status: OrderStatus,
}

/// Order operations over a backing store.
pub struct OrderLedger<'a> {
    backend: &'a dyn Backend,
}

impl<'a> OrderLedger<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Reserve a new order for the session's user at a store.
    ///
    /// The ID reservation and header insert are one indivisible step in
    /// the backing store; concurrent callers always get distinct IDs.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` without a logged-in user and
    /// `CoreError::StoreNotFound` for an unknown store.
    pub async fn begin_order(&self, session: &Session, store_id: StoreId) -> Result<OrderDraft> {
        let login = session.login()?;
        if !self.backend.store_exists(store_id).await? {
            return Err(CoreError::StoreNotFound(store_id));
        }

        let new_order = NewOrder {
            login: login.clone(),
            store_id,
            ordered_at: Utc::now(),
        };
        let id = self
            .backend
            .reserve_order(&new_order)
            .await
            .map_err(|e| match e {
                // The store was just seen, so the missing row is the user.
                RepositoryError::NotFound => CoreError::UserNotFound(login.clone()),
                other => CoreError::StoreUnavailable(other),
            })?;

        tracing::info!(order_id = %id, login = %login, store_id = %store_id, "Order reserved");
        Ok(OrderDraft {
            id,
            store_id,
            running_total: Decimal::ZERO,
            lines: Vec::new(),
            state: DraftState::Draft,
        })
    }

    /// Price an item, persist the line, and return the new running total.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidQuantity` if `quantity < 1`,
    /// `CoreError::ItemNotFound` for an unknown item, and
    /// `CoreError::TotalTooLarge` if the order total would exceed
    /// [`Price::MAX`]. The draft and the stored lines are unchanged on
    /// error.
    pub async fn add_line(
        &self,
        draft: &mut OrderDraft,
        item_name: &str,
        quantity: i32,
    ) -> Result<Decimal> {
        let quantity = Quantity::new(quantity).map_err(|_| CoreError::InvalidQuantity(quantity))?;
        let item = Catalog::new(self.backend).item(item_name).await?;
        let (total, combined) = draft.after_adding(&item.name, item.price, quantity)?;

        self.backend
            .insert_line(draft.id, &item.name, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CoreError::ItemNotFound(item.name.clone()),
                other => CoreError::StoreUnavailable(other),
            })?;

        draft.record(&item.name, combined, total);
        tracing::debug!(
            order_id = %draft.id,
            item = %item.name,
            quantity = %quantity,
            running_total = %draft.running_total,
            "Line added"
        );
        Ok(draft.running_total)
    }

    /// Write the draft's running total to the order header.
    ///
    /// A draft with no lines commits with a total of zero.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::OrderNotFound` if the header has disappeared.
    pub async fn commit_order(&self, draft: OrderDraft) -> Result<PlacedOrder> {
        self.backend
            .set_total(draft.id, draft.running_total)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CoreError::OrderNotFound(draft.id),
                other => CoreError::StoreUnavailable(other),
            })?;

        tracing::info!(
            order_id = %draft.id,
            total = %draft.running_total,
            lines = draft.lines.len(),
            "Order committed"
        );
        Ok(PlacedOrder {
            order_id: draft.id,
            store_id: draft.store_id,
            total: draft.running_total,
            lines: draft.lines,
            status: OrderStatus::Incomplete,
        })
    }

    /// Place a whole order in one call.
    ///
    /// Every quantity and item name is checked before the order ID is
    /// reserved, so bad input never leaves a stray header behind.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::begin_order`], [`Self::add_line`] or
    /// [`Self::commit_order`].
    pub async fn place_order(
        &self,
        session: &Session,
        store_id: StoreId,
        lines: &[(String, i32)],
    ) -> Result<PlacedOrder> {
        session.login()?;
        let catalog = Catalog::new(self.backend);
        for (name, quantity) in lines {
            if *quantity < 1 {
                return Err(CoreError::InvalidQuantity(*quantity));
            }
            catalog.item(name).await?;
        }

        let mut draft = self.begin_order(session, store_id).await?;
        for (name, quantity) in lines {
            self.add_line(&mut draft, name, *quantity).await?;
        }
        self.commit_order(draft).await
    }

    /// Overwrite an order's status.
    ///
    /// Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` for customers and
    /// `CoreError::OrderNotFound` for an unknown order.
    pub async fn update_status(
        &self,
        actor: Role,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<()> {
        if !actor.is_staff() {
            return Err(CoreError::Forbidden {
                role: actor,
                action: Action::UpdateOrderStatus,
            });
        }

        self.backend
            .set_status(order_id, status)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CoreError::OrderNotFound(order_id),
                other => CoreError::StoreUnavailable(other),
            })?;

        tracing::info!(
            order_id = %order_id,
            status = %status,
            role = %actor,
            "Order status updated"
        );
        Ok(())
    }

    /// Every order the identity may see, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn list_orders_for_user(&self, identity: &Identity) -> Result<Vec<Order>> {
        Ok(self.backend.list_orders(&identity.order_scope(), None).await?)
    }

    /// The newest `limit` orders the identity may see.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the query fails.
    pub async fn list_recent_orders(&self, identity: &Identity, limit: i64) -> Result<Vec<Order>> {
        Ok(self
            .backend
            .list_orders(&identity.order_scope(), Some(limit.max(0)))
            .await?)
    }

    /// An order header with its lines.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::OrderNotFound` if the order does not exist or
    /// belongs to another customer.
    pub async fn get_order_detail(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<OrderDetail> {
        let order = self
            .backend
            .get_order(order_id)
            .await?
            .filter(|order| identity.order_scope().includes(order))
            .ok_or(CoreError::OrderNotFound(order_id))?;
        let lines = self.backend.get_lines(order_id).await?;

        Ok(OrderDetail { order, lines })
    }
}
