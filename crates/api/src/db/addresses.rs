//! Address book repository.
//!
//! Every write that leaves an address with `is_default = true` first clears
//! the flag on the user's other addresses, in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use shopvely_core::{AddressId, ShippingSnapshot, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    full_name: String,
    phone: String,
    line1: String,
    line2: String,
    city: String,
    state: String,
    pincode: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            shipping: ShippingSnapshot {
                full_name: row.full_name,
                phone: row.phone,
                line1: row.line1,
                line2: row.line2,
                city: row.city,
                state: row.state,
                pincode: row.pincode,
            },
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

/// Load an address owned by `user_id` on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn fetch_owned(
    conn: &mut PgConnection,
    user_id: UserId,
    id: AddressId,
) -> Result<Option<Address>, RepositoryError> {
    let row = sqlx::query_as::<_, AddressRow>(
        r"
        SELECT id, user_id, full_name, phone, line1, line2, city, state, pincode,
               is_default, created_at
        FROM shop.address
        WHERE id = $1 AND user_id = $2
        ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Clear `is_default` on every address of the user except `keep`.
async fn clear_other_defaults(
    conn: &mut PgConnection,
    user_id: UserId,
    keep: Option<AddressId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.address
        SET is_default = FALSE
        WHERE user_id = $1 AND is_default AND ($2::int IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(keep)
    .execute(conn)
    .await?;

    Ok(())
}

/// Repository for user addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, full_name, phone, line1, line2, city, state, pincode,
                   is_default, created_at
            FROM shop.address
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, user_id, id).await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_other_defaults(&mut tx, user_id, None).await?;
        }

        let s = &input.shipping;
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO shop.address
                (user_id, full_name, phone, line1, line2, city, state, pincode, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, full_name, phone, line1, line2, city, state, pincode,
                      is_default, created_at
            ",
        )
        .bind(user_id)
        .bind(&s.full_name)
        .bind(&s.phone)
        .bind(&s.line1)
        .bind(&s.line2)
        .bind(&s.city)
        .bind(&s.state)
        .bind(&s.pincode)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Replace every field of one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            clear_other_defaults(&mut tx, user_id, Some(id)).await?;
        }

        let s = &input.shipping;
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE shop.address
            SET full_name = $3, phone = $4, line1 = $5, line2 = $6, city = $7,
                state = $8, pincode = $9, is_default = $10
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, full_name, phone, line1, line2, city, state, pincode,
                      is_default, created_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&s.full_name)
        .bind(&s.phone)
        .bind(&s.line1)
        .bind(&s.line2)
        .bind(&s.city)
        .bind(&s.state)
        .bind(&s.pincode)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete one of the user's addresses. Returns `false` if none matched.
    ///
    /// Orders keep their own copy of the address, so they are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.address WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Make one address the user's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fetch_owned(&mut tx, user_id, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        clear_other_defaults(&mut tx, user_id, Some(id)).await?;

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE shop.address
            SET is_default = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, full_name, phone, line1, line2, city, state, pincode,
                      is_default, created_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}
