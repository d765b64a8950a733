//! Order repository.
//!
//! Write helpers take a `&mut PgConnection` so the order workflow can run
//! several of them inside one transaction. Reads go through
//! [`OrderRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use shopvely_core::{
    Money, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, QuantityUpdate,
    ShippingSnapshot, StatusHistoryId, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItem, StatusHistoryEntry};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total_amount: Money,
    shipping_full_name: String,
    shipping_phone: String,
    shipping_line1: String,
    shipping_line2: String,
    shipping_city: String,
    shipping_state: String,
    shipping_pincode: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            total_amount: row.total_amount,
            shipping: ShippingSnapshot {
                full_name: row.shipping_full_name,
                phone: row.shipping_phone,
                line1: row.shipping_line1,
                line2: row.shipping_line2,
                city: row.shipping_city,
                state: row.shipping_state,
                pincode: row.shipping_pincode,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    product_title: String,
    quantity: i32,
    price: Money,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("order item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_title: row.product_title,
            quantity,
            price: row.price,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusHistoryRow {
    id: StatusHistoryId,
    old_status: Option<OrderStatus>,
    new_status: OrderStatus,
    changed_by: Option<UserId>,
    changed_at: DateTime<Utc>,
}

impl From<StatusHistoryRow> for StatusHistoryEntry {
    fn from(row: StatusHistoryRow) -> Self {
        Self {
            id: row.id,
            old_status: row.old_status,
            new_status: row.new_status,
            changed_by: row.changed_by,
            changed_at: row.changed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PriceRow {
    id: ProductId,
    price: Money,
}

const ORDER_COLUMNS: &str = r"
    id, user_id, status, total_amount,
    shipping_full_name, shipping_phone, shipping_line1, shipping_line2,
    shipping_city, shipping_state, shipping_pincode, created_at
";

// =============================================================================
// Transactional Writes
// =============================================================================

/// Insert a `pending` order with a zero total and the given shipping copy.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    shipping: &ShippingSnapshot,
) -> Result<Order, RepositoryError> {
    let sql = format!(
        r"
        INSERT INTO shop.order
            (user_id, status, total_amount,
             shipping_full_name, shipping_phone, shipping_line1, shipping_line2,
             shipping_city, shipping_state, shipping_pincode)
        VALUES ($1, $2, 0, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ORDER_COLUMNS}
        "
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .bind(&shipping.full_name)
        .bind(&shipping.phone)
        .bind(&shipping.line1)
        .bind(&shipping.line2)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.pincode)
        .fetch_one(conn)
        .await?;

    Ok(row.into())
}

/// Append a row to an order's status history.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_history(
    conn: &mut PgConnection,
    order_id: OrderId,
    old_status: Option<OrderStatus>,
    new_status: OrderStatus,
    changed_by: Option<UserId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_status_history (order_id, old_status, new_status, changed_by)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(old_status)
    .bind(new_status)
    .bind(changed_by)
    .execute(conn)
    .await?;

    Ok(())
}

/// Add a line to an order at a fixed unit price.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: Quantity,
    price: Money,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_item (order_id, product_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity.get())
    .bind(price)
    .execute(conn)
    .await?;

    Ok(())
}

/// Store an order's recomputed total.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn store_total(
    conn: &mut PgConnection,
    order_id: OrderId,
    total: Money,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.order SET total_amount = $2 WHERE id = $1
        ",
    )
    .bind(order_id)
    .bind(total)
    .execute(conn)
    .await?;

    Ok(())
}

/// Load an order and lock its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let sql = format!(
        r"
        SELECT {ORDER_COLUMNS}
        FROM shop.order
        WHERE id = $1
        FOR UPDATE
        "
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Store a new status on an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn update_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.order SET status = $2 WHERE id = $1
        ",
    )
    .bind(order_id)
    .bind(status)
    .execute(conn)
    .await?;

    Ok(())
}

/// Change or remove one line of an order.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the line does not belong to the order.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    item_id: OrderItemId,
    update: QuantityUpdate,
) -> Result<(), RepositoryError> {
    let result = match update {
        QuantityUpdate::Remove => {
            sqlx::query(
                r"
                DELETE FROM shop.order_item WHERE id = $1 AND order_id = $2
                ",
            )
            .bind(item_id)
            .bind(order_id)
            .execute(conn)
            .await?
        }
        QuantityUpdate::Set(quantity) => {
            sqlx::query(
                r"
                UPDATE shop.order_item SET quantity = $3
                WHERE id = $1 AND order_id = $2
                ",
            )
            .bind(item_id)
            .bind(order_id)
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

/// Current catalog prices for a set of products. Missing IDs are absent.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn current_prices(
    conn: &mut PgConnection,
    product_ids: &[ProductId],
) -> Result<HashMap<ProductId, Money>, RepositoryError> {
    let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
    let rows = sqlx::query_as::<_, PriceRow>(
        r"
        SELECT id, price FROM shop.product WHERE id = ANY($1)
        ",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|row| (row.id, row.price)).collect())
}

/// Lines of the given orders, paired with their order ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn fetch_items(
    conn: &mut PgConnection,
    order_ids: &[OrderId],
) -> Result<Vec<(OrderId, OrderItem)>, RepositoryError> {
    let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT oi.id, oi.order_id, oi.product_id, p.title AS product_title,
               oi.quantity, oi.price
        FROM shop.order_item oi
        JOIN shop.product p ON p.id = oi.product_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.id
        ",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            let order_id = row.order_id;
            OrderItem::try_from(row).map(|item| (order_id, item))
        })
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Read access to orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        );
        let orders: Vec<Order> = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for (order_id, item) in fetch_items(&mut conn, &ids).await? {
            items_by_order.entry(order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderDetail {
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                history: Vec::new(),
                order,
            })
            .collect())
    }

    /// One order with its lines and history.
    ///
    /// When `owner` is set, orders belonging to anyone else are not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.order
            WHERE id = $1 AND ($2::int IS NULL OR user_id = $2)
            "
        );
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let items = fetch_items(&mut conn, &[id])
            .await?
            .into_iter()
            .map(|(_, item)| item)
            .collect();

        let history = sqlx::query_as::<_, StatusHistoryRow>(
            r"
            SELECT id, old_status, new_status, changed_by, changed_at
            FROM shop.order_status_history
            WHERE order_id = $1
            ORDER BY changed_at DESC, id DESC
            ",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(Some(OrderDetail {
            order: row.into(),
            items,
            history,
        }))
    }
}
