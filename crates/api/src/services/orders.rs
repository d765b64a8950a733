//! Order workflow.
//!
//! Every operation here runs in one database transaction. An early return
//! drops the transaction without committing, which rolls it back.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::{info, instrument};

use shopvely_core::{
    AddressId, Money, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, QuantityUpdate,
    StatusTransition, StatusTransitionError, UserId, order_total,
};

use crate::db::{RepositoryError, addresses, carts, orders};

/// Errors from the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("address_id is required")]
    AddressRequired,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Address not found")]
    AddressNotFound,

    #[error("items may not be empty")]
    NoItems,

    #[error("Product not found")]
    ProductNotFound(ProductId),

    #[error("Order not found.")]
    OrderNotFound,

    #[error("Order item not found")]
    ItemNotFound,

    #[error("order total cannot exceed {}", Money::MAX)]
    TotalTooLarge,

    #[error(transparent)]
    Transition(#[from] StatusTransitionError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Recompute `total_amount` from the order's lines and store it.
///
/// Fails with `TotalTooLarge` before writing if the sum passes [`Money::MAX`].
async fn recompute_total(conn: &mut PgConnection, order_id: OrderId) -> Result<Money, OrderError> {
    let items = orders::fetch_items(&mut *conn, &[order_id]).await?;
    let total = order_total(items.iter().map(|(_, item)| (item.price, item.quantity)))
        .map_err(|_| OrderError::TotalTooLarge)?;
    orders::store_total(conn, order_id, total).await?;
    Ok(total)
}

/// Order workflow service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order shipped to `address_id`.
    ///
    /// Lines are priced at current catalog prices, the initial history entry
    /// is written, the total is recomputed and the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns, in this order of checking: `AddressRequired`, `EmptyCart`,
    /// `AddressNotFound`, `TotalTooLarge`. Database failures roll everything
    /// back.
    #[instrument(skip(self))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        address_id: Option<AddressId>,
    ) -> Result<OrderId, OrderError> {
        let address_id = address_id.ok_or(OrderError::AddressRequired)?;

        let mut tx = self.pool.begin().await?;

        let cart_id = carts::cart_id_for(&mut tx, user_id).await?;
        let lines = carts::fetch_lines(&mut tx, cart_id).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let address = addresses::fetch_owned(&mut tx, user_id, address_id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        let order = orders::insert_order(&mut tx, user_id, &address.shipping).await?;
        orders::insert_history(&mut tx, order.id, None, OrderStatus::Pending, None).await?;

        for line in &lines {
            orders::insert_item(
                &mut tx,
                order.id,
                line.product.id,
                line.quantity,
                line.product.price,
            )
            .await?;
        }

        let total = recompute_total(&mut tx, order.id).await?;
        carts::clear_lines(&mut tx, cart_id).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            items = lines.len(),
            total = %total,
            "Order created from cart"
        );
        Ok(order.id)
    }

    /// Create an order directly from a list of products and quantities.
    ///
    /// Prices come from the catalog. The user's cart is not touched.
    ///
    /// # Errors
    ///
    /// Returns `AddressRequired`, `NoItems`, `AddressNotFound`,
    /// `ProductNotFound` or `TotalTooLarge` for bad input.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create(
        &self,
        user_id: UserId,
        address_id: Option<AddressId>,
        items: &[(ProductId, Quantity)],
    ) -> Result<OrderId, OrderError> {
        let address_id = address_id.ok_or(OrderError::AddressRequired)?;
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut tx = self.pool.begin().await?;

        let address = addresses::fetch_owned(&mut tx, user_id, address_id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        let product_ids: Vec<ProductId> = items.iter().map(|(id, _)| *id).collect();
        let prices = orders::current_prices(&mut tx, &product_ids).await?;
        let priced = items
            .iter()
            .map(|&(product_id, quantity)| {
                prices
                    .get(&product_id)
                    .map(|&price| (product_id, quantity, price))
                    .ok_or(OrderError::ProductNotFound(product_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let order = orders::insert_order(&mut tx, user_id, &address.shipping).await?;
        orders::insert_history(&mut tx, order.id, None, OrderStatus::Pending, None).await?;

        for (product_id, quantity, price) in priced {
            orders::insert_item(&mut tx, order.id, product_id, quantity, price).await?;
        }

        let total = recompute_total(&mut tx, order.id).await?;

        tx.commit().await?;

        info!(order_id = %order.id, total = %total, "Order created");
        Ok(order.id)
    }

    /// Move an order to `next`, recording who did it.
    ///
    /// Requesting the current status changes nothing and writes no history.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, or `Transition` if the lifecycle forbids the move.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        changed_by: UserId,
    ) -> Result<StatusTransition, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::lock_order(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let transition = order.status.transition_to(next)?;
        if let StatusTransition::Changed { from, to } = transition {
            orders::update_status(&mut tx, order_id, to).await?;
            orders::insert_history(&mut tx, order_id, Some(from), to, Some(changed_by)).await?;
            tx.commit().await?;
            info!(%order_id, %from, %to, "Order status changed");
        }

        Ok(transition)
    }

    /// Set the quantity of one order line; zero or less removes it.
    ///
    /// Returns the recomputed order total.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `ItemNotFound`, or `TotalTooLarge` if the new
    /// quantity pushes the total past [`Money::MAX`].
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        quantity: i32,
    ) -> Result<Money, OrderError> {
        let mut tx = self.pool.begin().await?;

        orders::lock_order(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        orders::update_item(
            &mut tx,
            order_id,
            item_id,
            QuantityUpdate::from_requested(quantity),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => OrderError::ItemNotFound,
            other => OrderError::Repository(other),
        })?;

        let total = recompute_total(&mut tx, order_id).await?;

        tx.commit().await?;

        info!(%order_id, %item_id, total = %total, "Order item updated");
        Ok(total)
    }
}
