//! Cart queries.
//!
//! Every function takes a connection so the cart service can run a whole
//! mutation, including the total check, in one transaction.

use sqlx::PgConnection;

use shopvely_core::{CartId, CartItemId, Money, ProductId, Quantity, QuantityUpdate, UserId};

use super::RepositoryError;
use crate::models::{CartEntry, ProductSummary};

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    quantity: i32,
    product_id: ProductId,
    title: String,
    price: Money,
    image: String,
}

impl TryFrom<CartLineRow> for CartEntry {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            product: ProductSummary {
                id: row.product_id,
                title: row.title,
                price: row.price,
                image: row.image,
            },
            quantity,
        })
    }
}

/// Get the user's cart ID, creating the cart on first access.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cart_id_for(conn: &mut PgConnection, user_id: UserId) -> Result<CartId, RepositoryError> {
    let id = sqlx::query_scalar::<_, CartId>(
        r"
        INSERT INTO shop.cart (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        ",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Load a cart's lines with current catalog data, oldest line first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored quantity is not positive.
pub async fn fetch_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartEntry>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT ci.id, ci.quantity, p.id AS product_id, p.title, p.price, p.image
        FROM shop.cart_item ci
        JOIN shop.product p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Add `quantity` units of a product, creating the line if needed.
///
/// The increment is a single upsert, so concurrent adds never lose units.
/// Returns the line's new quantity, or `None` if the sum would not fit in
/// the quantity column (the line is left unchanged).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn add_quantity(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<Option<Quantity>, RepositoryError> {
    let stored = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO shop.cart_item AS ci (cart_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = ci.quantity + EXCLUDED.quantity
            WHERE ci.quantity::bigint + EXCLUDED.quantity <= 2147483647
        RETURNING quantity
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity.get())
    .fetch_optional(conn)
    .await?;

    stored
        .map(|q| {
            Quantity::new(q).map_err(|e| {
                RepositoryError::DataCorruption(format!("cart {cart_id} product {product_id}: {e}"))
            })
        })
        .transpose()
}

/// Apply a quantity change to a line of this cart.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line is not in this cart.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
    update: QuantityUpdate,
) -> Result<(), RepositoryError> {
    let result = match update {
        QuantityUpdate::Remove => return remove_item(conn, cart_id, item_id).await,
        QuantityUpdate::Set(quantity) => {
            sqlx::query(
                r"
                UPDATE shop.cart_item SET quantity = $3
                WHERE id = $1 AND cart_id = $2
                ",
            )
            .bind(item_id)
            .bind(cart_id)
            .bind(quantity.get())
            .execute(conn)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Delete a line of this cart.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line is not in this cart.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: CartItemId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        DELETE FROM shop.cart_item WHERE id = $1 AND cart_id = $2
        ",
    )
    .bind(item_id)
    .bind(cart_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Delete every line of a cart. The cart itself is kept.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_lines(conn: &mut PgConnection, cart_id: CartId) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        DELETE FROM shop.cart_item WHERE cart_id = $1
        ",
    )
    .bind(cart_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
