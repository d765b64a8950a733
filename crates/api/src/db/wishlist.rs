//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopvely_core::{ProductId, UserId, WishlistId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::{ProductView, Wishlist};

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: WishlistId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for per-user wishlists.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the user's wishlist, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Wishlist, RepositoryError> {
        let header = sqlx::query_as::<_, WishlistRow>(
            r"
            INSERT INTO shop.wishlist (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        let products = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.title, p.description, p.price, p.image, p.rating,
                   p.num_reviews, p.created_at
            FROM shop.wishlist_product wp
            JOIN shop.product p ON p.id = wp.product_id
            WHERE wp.wishlist_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .bind(header.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Wishlist {
            id: header.id,
            products: products
                .into_iter()
                .map(|row| ProductView {
                    product: row.into(),
                    is_in_wishlist: true,
                })
                .collect(),
            created_at: header.created_at,
            updated_at: header.updated_at,
        })
    }

    /// Add a product. Returns `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add(
        &self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.wishlist_product (wishlist_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(wishlist_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        let added = result.rows_affected() == 1;
        if added {
            self.touch(wishlist_id).await?;
        }
        Ok(added)
    }

    /// Remove a product. Returns `false` if it was not present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove(
        &self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.wishlist_product
            WHERE wishlist_id = $1 AND product_id = $2
            ",
        )
        .bind(wishlist_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        let removed = result.rows_affected() == 1;
        if removed {
            self.touch(wishlist_id).await?;
        }
        Ok(removed)
    }

    async fn touch(&self, wishlist_id: WishlistId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE shop.wishlist SET updated_at = NOW() WHERE id = $1
            ",
        )
        .bind(wishlist_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
