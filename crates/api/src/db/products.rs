//! Catalog repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopvely_core::{Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductFilter, ProductView};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    title: String,
    description: String,
    price: Money,
    image: String,
    rating: f64,
    num_reviews: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            rating: row.rating,
            num_reviews: row.num_reviews,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductViewRow {
    #[sqlx(flatten)]
    product: ProductRow,
    is_in_wishlist: bool,
}

impl From<ProductViewRow> for ProductView {
    fn from(row: ProductViewRow) -> Self {
        Self {
            product: row.product.into(),
            is_in_wishlist: row.is_in_wishlist,
        }
    }
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products newest first, flagged against `viewer`'s wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        viewer: Option<UserId>,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductViewRow>(
            r"
            SELECT p.id, p.title, p.description, p.price, p.image, p.rating,
                   p.num_reviews, p.created_at,
                   EXISTS (
                       SELECT 1 FROM shop.wishlist w
                       JOIN shop.wishlist_product wp ON wp.wishlist_id = w.id
                       WHERE w.user_id = $1 AND wp.product_id = p.id
                   ) AS is_in_wishlist
            FROM shop.product p
            WHERE ($2::text IS NULL OR p.title ILIKE $2)
              AND ($3::numeric IS NULL OR p.price >= $3)
              AND ($4::numeric IS NULL OR p.price <= $4)
              AND ($5::float8 IS NULL OR p.rating >= $5)
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .bind(viewer)
        .bind(filter.search_term().map(contains_pattern))
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.min_rating)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one product, flagged against `viewer`'s wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_view(
        &self,
        id: ProductId,
        viewer: Option<UserId>,
    ) -> Result<Option<ProductView>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductViewRow>(
            r"
            SELECT p.id, p.title, p.description, p.price, p.image, p.rating,
                   p.num_reviews, p.created_at,
                   EXISTS (
                       SELECT 1 FROM shop.wishlist w
                       JOIN shop.wishlist_product wp ON wp.wishlist_id = w.id
                       WHERE w.user_id = $1 AND wp.product_id = p.id
                   ) AS is_in_wishlist
            FROM shop.product p
            WHERE p.id = $2
            ",
        )
        .bind(viewer)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, image, rating, num_reviews, created_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Whether a product with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (SELECT 1 FROM shop.product WHERE id = $1)
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.product (title, description, price, image, rating, num_reviews)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, price, image, rating, num_reviews, created_at
            ",
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.rating)
        .bind(product.num_reviews)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Overwrite a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.product
            SET title = $2, description = $3, price = $4, image = $5,
                rating = $6, num_reviews = $7
            WHERE id = $1
            RETURNING id, title, description, price, image, rating, num_reviews, created_at
            ",
        )
        .bind(id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.rating)
        .bind(product.num_reviews)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("tea"), "%tea%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
