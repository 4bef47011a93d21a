//! Error taxonomy for the order backend.
//!
//! Every operation returns [`CoreError`]. Validation failures are
//! recoverable: the terminal reports them and the session carries on.
//! A failed statement against the backing store is reported the same way
//! but is not something the user can fix by retyping.

use thiserror::Error;

use crustline_core::{Login, OrderId, Price, Role, StoreId};

use crate::db::RepositoryError;
use crate::router::Action;

/// Errors surfaced by the account, catalog, ledger and router layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No user is logged in to the session.
    #[error("not logged in")]
    Unauthenticated,

    /// Wrong password or unknown login. The two are never distinguished.
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("login already exists: {0}")]
    DuplicateLogin(Login),

    #[error("user not found: {0}")]
    UserNotFound(Login),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("item already exists: {0}")]
    DuplicateItem(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("store not found: {0}")]
    StoreNotFound(StoreId),

    /// The session's role is not granted the action.
    #[error("a {role} may not {action}")]
    Forbidden { role: Role, action: Action },

    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i32),

    /// Adding a line would push the order total past what a stored
    /// amount can hold. Nothing is persisted.
    #[error("order total cannot exceed {}", Price::MAX)]
    TotalTooLarge,

    /// Input that does not parse into the expected value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A statement against the backing store failed.
    #[error("backing store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),
}

impl CoreError {
    /// Whether the user can recover by correcting their input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_))
    }
}

/// Result type alias for `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failures_are_not_recoverable() {
        let err = CoreError::from(RepositoryError::DataCorruption("bad row".to_owned()));
        assert!(!err.is_recoverable());
        assert!(CoreError::InvalidQuantity(0).is_recoverable());
        assert!(CoreError::Unauthenticated.is_recoverable());
        assert!(CoreError::TotalTooLarge.is_recoverable());
    }

    #[test]
    fn test_total_too_large_names_the_limit() {
        assert_eq!(
            CoreError::TotalTooLarge.to_string(),
            "order total cannot exceed $99999999.99"
        );
    }

    #[test]
    fn test_forbidden_names_role_and_action() {
        let err = CoreError::Forbidden {
            role: Role::Customer,
            action: Action::UpdateMenu,
        };
        assert_eq!(err.to_string(), "a customer may not update the menu");
    }
}
