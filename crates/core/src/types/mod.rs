//! Core types for Crustline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod id;
pub mod login;
pub mod price;
pub mod status;

pub use credential::Password;
pub use id::*;
pub use login::{Login, LoginError};
pub use price::{Price, PriceError, Quantity, QuantityError};
pub use status::*;
