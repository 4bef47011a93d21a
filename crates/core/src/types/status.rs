//! Role and status enums.
//!
//! Both are stored as text columns. Parsing is lenient about case and
//! padding (the legacy schema uses fixed-width `CHAR` columns) but only
//! accepts the closed set of variants below.

use serde::{Deserialize, Serialize};

/// Access tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses the menu and places orders.
    Customer,
    /// Delivery staff; may also advance order status.
    Driver,
    /// Full access, including catalog and user administration.
    Manager,
}

impl Role {
    /// Every role, in privilege order.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Driver, Self::Manager];

    /// The stored text value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Driver => "driver",
            Self::Manager => "manager",
        }
    }

    /// Whether this role is staff (anything but a customer).
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0:?} (expected customer, driver or manager)")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "driver" | "staff" => Ok(Self::Driver),
            "manager" => Ok(Self::Manager),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

/// Fulfillment status of an order.
///
/// The placement flow only ever writes [`OrderStatus::Incomplete`], which
/// means "awaiting fulfillment". Staff move orders through the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Incomplete,
    InProgress,
    Complete,
    Cancelled,
}

impl OrderStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [
        Self::Incomplete,
        Self::InProgress,
        Self::Complete,
        Self::Cancelled,
    ];

    /// The stored text value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further fulfillment happens in this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0:?} (expected incomplete, in-progress, complete or cancelled)")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    /// Accepts any casing and `-`, `_` or space between words, so
    /// "In Progress", "in_progress" and "IN-PROGRESS" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "incomplete" => Ok(Self::Incomplete),
            "inprogress" => Ok(Self::InProgress),
            "complete" | "completed" => Ok(Self::Complete),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_handles_char_padding() {
        assert_eq!("customer            ".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Driver);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_is_staff() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Driver.is_staff());
        assert!(Role::Manager.is_staff());
    }

    #[test]
    fn test_status_parse_normalizes_separators() {
        for input in ["in-progress", "In Progress", "in_progress", " IN-PROGRESS "] {
            assert_eq!(input.parse::<OrderStatus>().unwrap(), OrderStatus::InProgress);
        }
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_status_rejects_free_text() {
        let err = "out for delivery".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.0, "out for delivery");
    }

    #[test]
    fn test_status_default_and_terminal() {
        assert_eq!(OrderStatus::default(), OrderStatus::Incomplete);
        assert!(OrderStatus::Complete.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_status_serde_matches_stored_text() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
