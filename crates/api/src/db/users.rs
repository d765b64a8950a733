//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopvely_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: Option<String>,
    first_name: String,
    last_name: String,
    is_staff: bool,
    date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_staff: row.is_staff,
            date_joined: row.date_joined,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: Option<&'a Email>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_staff: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, first_name, last_name, is_staff, date_joined
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        new_user: &NewUser<'_>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (username, email, first_name, last_name, is_staff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, first_name, last_name, is_staff, date_joined
            ",
        )
        .bind(new_user.username)
        .bind(new_user.email.map(Email::as_str))
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.is_staff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "username"))?;

        let user = User::try_from(row)?;

        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user and their password hash by username.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name,
                   u.is_staff, u.date_joined, p.password_hash
            FROM shop.user u
            LEFT JOIN shop.user_password p ON u.id = p.user_id
            WHERE u.username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((row.user.try_into()?, password_hash)))
    }

    /// Get a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash FROM shop.user_password WHERE user_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Set or replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
