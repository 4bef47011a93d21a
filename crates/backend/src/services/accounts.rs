//! Account directory.
//!
//! Registration, credential resolution and profile updates. Passwords are
//! compared verbatim by the backing store and never logged.

use crustline_core::{Login, Password, Role};

use crate::db::{Backend, RepositoryError};
use crate::error::{CoreError, Result};
use crate::models::user::renamed_to;
use crate::models::{NewUser, ProfileField, User, UserField};

/// Account operations over a backing store.
pub struct AccountDirectory<'a> {
    backend: &'a dyn Backend,
}

impl<'a> AccountDirectory<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Self-register a customer account with no favorite items.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the login is malformed and
    /// `CoreError::DuplicateLogin` if it is taken.
    pub async fn register(&self, login: &str, password: &str, phone: &str) -> Result<Login> {
        let login = Login::parse(login).map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        let user = NewUser::customer(
            login.clone(),
            Password::new(password),
            phone.trim().to_owned(),
        );
        self.create_account(&user).await?;
        Ok(login)
    }

    /// Create an account with an explicit role.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DuplicateLogin` if the login is taken.
    pub async fn create_account(&self, user: &NewUser) -> Result<()> {
        self.backend.insert_user(user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => CoreError::DuplicateLogin(user.login.clone()),
            other => CoreError::StoreUnavailable(other),
        })?;

        tracing::info!(login = %user.login, role = %user.role, "Account created");
        Ok(())
    }

    /// Resolve a login and password to the account's role.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredentials` for an unknown login and for
    /// a wrong password alike.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<(Login, Role)> {
        let Ok(login) = Login::parse(login) else {
            tracing::warn!("Login failed: malformed login");
            return Err(CoreError::InvalidCredentials);
        };

        match self.backend.find_role(&login, &Password::new(password)).await? {
            Some(role) => {
                tracing::info!(login = %login, role = %role, "Login succeeded");
                Ok((login, role))
            }
            None => {
                tracing::warn!(login = %login, "Login failed");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    /// The profile of an account.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` if the account does not exist.
    pub async fn profile(&self, login: &Login) -> Result<User> {
        self.backend
            .get_user(login)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(login.clone()))
    }

    /// The account's current role, or `None` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StoreUnavailable` if the lookup fails.
    pub async fn current_role(&self, login: &Login) -> Result<Option<Role>> {
        Ok(self.backend.get_user(login).await?.map(|user| user.role))
    }

    /// Change the caller's own password or phone number.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` if the account does not exist.
    pub async fn update_self(&self, login: &Login, changes: Vec<ProfileField>) -> Result<()> {
        let changes: Vec<UserField> = changes.into_iter().map(UserField::from).collect();
        self.apply_user_changes(login, &changes).await
    }

    /// Change any field of any account, including a rename.
    ///
    /// The whole batch applies or none of it does. A rename moves every
    /// order owned by the old login to the new one.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` if the target does not exist and
    /// `CoreError::DuplicateLogin` if the new login is taken.
    pub async fn update_any(&self, target: &Login, changes: &[UserField]) -> Result<()> {
        self.apply_user_changes(target, changes).await
    }

    async fn apply_user_changes(&self, target: &Login, changes: &[UserField]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        self.backend
            .update_user(target, changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CoreError::UserNotFound(target.clone()),
                RepositoryError::Conflict(_) => renamed_to(changes).map_or_else(
                    || CoreError::DuplicateLogin(target.clone()),
                    |new| CoreError::DuplicateLogin(new.clone()),
                ),
                other => CoreError::StoreUnavailable(other),
            })?;

        tracing::info!(login = %target, fields = changes.len(), "Account updated");
        if let Some(new) = renamed_to(changes) {
            tracing::info!(from = %target, to = %new, "Account renamed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;

    #[tokio::test]
    async fn test_register_creates_customer() {
        let backend = MemoryBackend::new();
        let accounts = AccountDirectory::new(&backend);

        let login = accounts.register("alice", "pw1", "555-1111").await.unwrap();
        let (_, role) = accounts.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(role, Role::Customer);

        let profile = accounts.profile(&login).await.unwrap();
        assert_eq!(profile.phone_num, "555-1111");
        assert!(profile.favorite_items.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_login() {
        let backend = MemoryBackend::new();
        let accounts = AccountDirectory::new(&backend);
        accounts.register("alice", "pw1", "").await.unwrap();

        let err = accounts.register("alice", "other", "").await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateLogin(login) if login.as_str() == "alice"));
    }

    #[tokio::test]
    async fn test_register_rejects_blank_login() {
        let backend = MemoryBackend::new();
        let err = AccountDirectory::new(&backend)
            .register("   ", "pw", "")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_authenticate_failures_look_alike() {
        let backend = MemoryBackend::new();
        let accounts = AccountDirectory::new(&backend);
        accounts.register("alice", "pw1", "").await.unwrap();

        let wrong_password = accounts.authenticate("alice", "nope").await.unwrap_err();
        let unknown_login = accounts.authenticate("mallory", "pw1").await.unwrap_err();
        let malformed = accounts.authenticate("", "pw1").await.unwrap_err();
        for err in [wrong_password, unknown_login, malformed] {
            assert!(matches!(err, CoreError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_update_self_changes_password() {
        let backend = MemoryBackend::new();
        let accounts = AccountDirectory::new(&backend);
        let login = accounts.register("alice", "pw1", "").await.unwrap();

        accounts
            .update_self(&login, vec![ProfileField::Password(Password::new("pw2"))])
            .await
            .unwrap();

        assert!(accounts.authenticate("alice", "pw1").await.is_err());
        assert!(accounts.authenticate("alice", "pw2").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_any_unknown_target() {
        let backend = MemoryBackend::new();
        let ghost = Login::parse("ghost").unwrap();
        let err = AccountDirectory::new(&backend)
            .update_any(&ghost, &[UserField::Role(Role::Manager)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_any_rename_conflict_names_new_login() {
        let backend = MemoryBackend::new();
        let accounts = AccountDirectory::new(&backend);
        let alice = accounts.register("alice", "pw", "").await.unwrap();
        accounts.register("bob", "pw", "").await.unwrap();

        let err = accounts
            .update_any(&alice, &[UserField::Login(Login::parse("bob").unwrap())])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateLogin(login) if login.as_str() == "bob"));
    }
}
