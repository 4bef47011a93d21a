//! Crustline Backend - Order lifecycle, accounts and role-gated dispatch.
//!
//! # Architecture
//!
//! - [`db`] - Backing-store traits with `PostgreSQL` and in-memory implementations
//! - [`services`] - Account directory, catalog and order ledger
//! - [`session`] - Per-client identity
//! - [`router`] - Role × action policy and request dispatch
//! - [`config`] - Connection settings from the environment
//! - [`error`] - The error taxonomy every operation returns
//!
//! A presentation layer owns one [`Session`] per client and sends typed
//! [`Request`]s through a [`CommandRouter`]. Order placement can also be
//! driven step by step through [`OrderLedger`] after
//! [`CommandRouter::authorize`] grants [`Action::PlaceOrder`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod router;
pub mod services;
pub mod session;

pub use config::{BackendConfig, ConfigError};
pub use db::{Backend, MemoryBackend, PgBackend, RepositoryError};
pub use error::{CoreError, Result};
pub use router::{
    Action, CommandRouter, MenuChange, Request, Response, available_actions, is_allowed,
};
pub use services::{AccountDirectory, Catalog, MenuQuery, OrderDraft, OrderLedger, PlacedOrder};
pub use session::{Identity, Session};
