//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopvely_core::{
    Money, MoneyError, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, ShippingSnapshot,
    StatusHistoryId, UserId,
};

/// An order header.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Always the sum of the order's line subtotals.
    pub total_amount: Money,
    /// Address copied at creation time.
    pub shipping: ShippingSnapshot,
    pub created_at: DateTime<Utc>,
}

/// A purchased line, priced at the time of the order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub product_title: String,
    pub quantity: Quantity,
    /// Unit price captured when the order was placed.
    pub price: Money,
}

impl OrderItem {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::TooLarge`] if the line passes [`Money::MAX`].
    pub fn subtotal(&self) -> Result<Money, MoneyError> {
        self.price.times(self.quantity)
    }
}

/// One entry of an order's status audit log.
#[derive(Debug, Clone, Serialize)]
pub struct StatusHistoryEntry {
    pub id: StatusHistoryId,
    /// `None` for the entry written when the order was created.
    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    /// `None` when the system made the change.
    pub changed_by: Option<UserId>,
    pub changed_at: DateTime<Utc>,
}

/// An order with its lines and, when loaded, its status history.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Newest first. Empty in list views.
    pub history: Vec<StatusHistoryEntry>,
}
