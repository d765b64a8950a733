//! Cart mutations.
//!
//! Each write runs in one transaction that ends by pricing the cart. A cart
//! whose total would pass [`Money::MAX`] is rejected and the write rolls back.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::{info, instrument};

use shopvely_core::{
    CartId, CartItemId, Money, ProductId, Quantity, QuantityError, QuantityUpdate, UserId,
};

use crate::db::{ProductRepository, RepositoryError, carts};
use crate::models::Cart;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart item not found")]
    ItemNotFound,

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("cart total cannot exceed {}", Money::MAX)]
    TotalTooLarge,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

fn item_not_found(err: RepositoryError) -> CartError {
    match err {
        RepositoryError::NotFound => CartError::ItemNotFound,
        other => CartError::Repository(other),
    }
}

/// Load and price a cart.
async fn priced(conn: &mut PgConnection, cart_id: CartId) -> Result<Cart, CartError> {
    let entries = carts::fetch_lines(conn, cart_id).await?;
    Cart::new(cart_id, entries).map_err(|_| CartError::TotalTooLarge)
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, created on first access.
    ///
    /// # Errors
    ///
    /// Returns `TotalTooLarge` if catalog price changes pushed the total
    /// past [`Money::MAX`].
    pub async fn show(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart_id = carts::cart_id_for(&mut conn, user_id).await?;
        priced(&mut conn, cart_id).await
    }

    /// Add `quantity` units of a product, or add to its existing line.
    ///
    /// # Errors
    ///
    /// Returns, in this order of checking: `ProductNotFound`,
    /// `Quantity(NotPositive)`, `Quantity(Overflow)`, `TotalTooLarge`.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        let product_id = product_id.ok_or(CartError::ProductNotFound)?;
        if !ProductRepository::new(self.pool).exists(product_id).await? {
            return Err(CartError::ProductNotFound);
        }
        let quantity = Quantity::new(quantity)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = carts::cart_id_for(&mut tx, user_id).await?;
        let line_quantity = carts::add_quantity(&mut tx, cart_id, product_id, quantity)
            .await?
            .ok_or(QuantityError::Overflow)?;
        let cart = priced(&mut tx, cart_id).await?;

        tx.commit().await?;

        info!(%cart_id, %product_id, quantity = line_quantity.get(), "Product added to cart");
        Ok(cart)
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the line is missing or in another user's
    /// cart, `TotalTooLarge` if the new total passes [`Money::MAX`].
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        user_id: UserId,
        item_id: Option<CartItemId>,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        let item_id = item_id.ok_or(CartError::ItemNotFound)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = carts::cart_id_for(&mut tx, user_id).await?;
        carts::update_item(
            &mut tx,
            cart_id,
            item_id,
            QuantityUpdate::from_requested(quantity),
        )
        .await
        .map_err(item_not_found)?;
        let cart = priced(&mut tx, cart_id).await?;

        tx.commit().await?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the line is missing or in another user's cart.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: Option<CartItemId>,
    ) -> Result<Cart, CartError> {
        let item_id = item_id.ok_or(CartError::ItemNotFound)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = carts::cart_id_for(&mut tx, user_id).await?;
        carts::remove_item(&mut tx, cart_id, item_id)
            .await
            .map_err(item_not_found)?;
        let cart = priced(&mut tx, cart_id).await?;

        tx.commit().await?;
        Ok(cart)
    }
}
