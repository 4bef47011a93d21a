//! Business logic over the backing store.
//!
//! # Services
//!
//! - `accounts` - Account directory: registration, credential checks, profile edits
//! - `catalog` - Menu items and store locations
//! - `ledger` - Order placement protocol, status updates and order queries
//!
//! Services borrow a `&dyn Backend` and are cheap to construct per call.

pub mod accounts;
pub mod catalog;
pub mod ledger;

pub use accounts::AccountDirectory;
pub use catalog::{Catalog, MenuQuery};
pub use ledger::{DraftState, OrderDraft, OrderLedger, PlacedOrder, RECENT_ORDER_LIMIT};
