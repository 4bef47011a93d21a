//! Account queries.

use async_trait::async_trait;

use crustline_core::{Login, Password, Role};

use super::{PgBackend, classify};
use crate::db::{RepositoryError, UserStore};
use crate::models::user::renamed_to;
use crate::models::{NewUser, User, UserField};

const LOGIN_TAKEN: &str = "login already exists";

#[derive(sqlx::FromRow)]
struct UserRow {
    login: String,
    phone_num: Option<String>,
    role: String,
    favorite_items: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.login).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid login in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            login,
            phone_num: row.phone_num.unwrap_or_default().trim().to_owned(),
            role,
            favorite_items: row.favorite_items.unwrap_or_default().trim().to_owned(),
        })
    }
}

#[async_trait]
impl UserStore for PgBackend {
    async fn insert_user(&self, user: &NewUser) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO Users (login, password, phoneNum, role, favoriteItems)
            VALUES ($1, $2, $3, $4, '')
            ",
        )
        .bind(&user.login)
        .bind(user.password.expose())
        .bind(&user.phone_num)
        .bind(user.role.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| classify(e, LOGIN_TAKEN))?;

        Ok(())
    }

    async fn find_role(
        &self,
        login: &Login,
        password: &Password,
    ) -> Result<Option<Role>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT role FROM Users WHERE login = $1 AND password = $2")
                .bind(login)
                .bind(password.expose())
                .fetch_optional(self.pool())
                .await?;

        row.map(|(role,)| {
            role.parse::<Role>()
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
        })
        .transpose()
    }

    async fn get_user(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT login, phoneNum AS phone_num, role, favoriteItems AS favorite_items
            FROM Users
            WHERE login = $1
            ",
        )
        .bind(login)
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn update_user(
        &self,
        login: &Login,
        changes: &[UserField],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let found: Option<(String,)> =
            sqlx::query_as("SELECT login FROM Users WHERE login = $1 FOR UPDATE")
                .bind(login)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Err(RepositoryError::NotFound);
        }

        for change in changes {
            let (sql, value) = match change {
                UserField::Login(_) => continue,
                UserField::Password(password) => (
                    "UPDATE Users SET password = $2 WHERE login = $1",
                    password.expose(),
                ),
                UserField::Role(role) => {
                    ("UPDATE Users SET role = $2 WHERE login = $1", role.as_str())
                }
                UserField::FavoriteItems(items) => (
                    "UPDATE Users SET favoriteItems = $2 WHERE login = $1",
                    items.as_str(),
                ),
                UserField::Phone(phone) => (
                    "UPDATE Users SET phoneNum = $2 WHERE login = $1",
                    phone.as_str(),
                ),
            };
            sqlx::query(sql)
                .bind(login)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(new_login) = renamed_to(changes).filter(|new| *new != login) {
            // Orders move first; the deferred FK is checked at commit.
            sqlx::query("SET CONSTRAINTS ALL DEFERRED")
                .execute(&mut *tx)
                .await?;
            let moved = sqlx::query("UPDATE FoodOrder SET login = $2 WHERE login = $1")
                .bind(login)
                .bind(new_login)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE Users SET login = $2 WHERE login = $1")
                .bind(login)
                .bind(new_login)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(e, LOGIN_TAKEN))?;
            tracing::debug!(
                from = %login,
                to = %new_login,
                orders = moved.rows_affected(),
                "Renamed login"
            );
        }

        tx.commit().await.map_err(|e| classify(e, LOGIN_TAKEN))?;
        Ok(())
    }
}
