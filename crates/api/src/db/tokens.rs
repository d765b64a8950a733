//! Bearer token storage.
//!
//! Only HMAC digests are stored, never the raw token.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopvely_core::{TokenKind, UserId};

use super::RepositoryError;

/// Repository for issued API tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        kind: TokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.api_token (user_id, kind, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(kind)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resolve an unexpired token of the given kind to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active(
        &self,
        token_hash: &str,
        kind: TokenKind,
    ) -> Result<Option<UserId>, RepositoryError> {
        let user_id = sqlx::query_scalar::<_, UserId>(
            r"
            SELECT user_id FROM shop.api_token
            WHERE token_hash = $1 AND kind = $2 AND expires_at > NOW()
            ",
        )
        .bind(token_hash)
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;

        Ok(user_id)
    }

    /// Delete every token of `kind` belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke_all(&self, user_id: UserId, kind: TokenKind) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.api_token WHERE user_id = $1 AND kind = $2
            ",
        )
        .bind(user_id)
        .bind(kind)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a user's expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_expired(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.api_token WHERE user_id = $1 AND expires_at <= NOW()
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
