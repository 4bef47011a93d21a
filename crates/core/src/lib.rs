//! Crustline Core - Domain types for the order-management backend.
//!
//! This crate provides the types shared by every Crustline component:
//! - `backend` - Account directory, catalog, order ledger, session and command router
//! - `cli` - Interactive terminal and migration tooling
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. Values
//! are validated once at construction so the backend can trust them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, logins, passwords, prices, quantities, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
