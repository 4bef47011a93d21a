//! Domain models for the order backend.
//!
//! These types represent validated domain objects separate from database
//! row types. Row structs live next to the queries that produce them.

pub mod item;
pub mod order;
pub mod store;
pub mod user;

pub use item::{Item, ItemField, ItemFilter, SortKey};
pub use order::{NewOrder, Order, OrderDetail, OrderLine, OrderScope};
pub use store::Store;
pub use user::{NewUser, ProfileField, User, UserField};
