//! Account management commands.
//!
//! Self-registration in the terminal always creates customers; this is
//! how drivers and managers get accounts.
//!
//! # Usage
//!
//! ```bash
//! crustline user create -l dave -p secret -r driver --phone 555-0100
//! ```

use thiserror::Error;

use crustline_backend::models::NewUser;
use crustline_backend::{AccountDirectory, BackendConfig, CoreError};
use crustline_core::{Login, Password, Role};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: customer, driver, manager")]
    InvalidRole(String),

    #[error("Invalid login: {0}")]
    InvalidLogin(#[from] crustline_core::LoginError),

    #[error(transparent)]
    Account(#[from] CoreError),
}

/// Create an account with an explicit role.
///
/// # Errors
///
/// Returns `UserError` if the input is invalid, the database is
/// unreachable, or the login is taken.
pub async fn create(
    config: &BackendConfig,
    login: &str,
    password: &str,
    role: &str,
    phone: &str,
) -> Result<(), UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let login = Login::parse(login)?;

    let backend = super::connect(config).await?;
    let user = NewUser {
        login,
        password: Password::new(password),
        phone_num: phone.trim().to_owned(),
        role,
    };
    AccountDirectory::new(&backend).create_account(&user).await?;

    tracing::info!(login = %user.login, role = %role, "User created successfully!");
    Ok(())
}
