//! User domain types.

use serde::Serialize;

use crustline_core::{Login, Password, Role};

/// A user account without its credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique login.
    pub login: Login,
    /// Contact phone number (free text).
    pub phone_num: String,
    /// Access tier.
    pub role: Role,
    /// Favorite items (free text list).
    pub favorite_items: String,
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: Login,
    pub password: Password,
    pub phone_num: String,
    pub role: Role,
}

impl NewUser {
    /// A self-registered account. Always a customer.
    #[must_use]
    pub fn customer(login: Login, password: Password, phone_num: String) -> Self {
        Self {
            login,
            password,
            phone_num,
            role: Role::Customer,
        }
    }
}

/// A field a user may change on their own profile.
#[derive(Debug, Clone)]
pub enum ProfileField {
    Password(Password),
    Phone(String),
}

/// A field a manager may change on any account.
#[derive(Debug, Clone)]
pub enum UserField {
    /// Rename the account. Orders follow the new login.
    Login(Login),
    Password(Password),
    Role(Role),
    FavoriteItems(String),
    Phone(String),
}

impl From<ProfileField> for UserField {
    fn from(field: ProfileField) -> Self {
        match field {
            ProfileField::Password(password) => Self::Password(password),
            ProfileField::Phone(phone) => Self::Phone(phone),
        }
    }
}

/// The login a batch of changes renames to, if any. The last rename wins.
#[must_use]
pub fn renamed_to(changes: &[UserField]) -> Option<&Login> {
    changes.iter().rev().find_map(|change| match change {
        UserField::Login(login) => Some(login),
        _ => None,
    })
}
