//! Wishlist types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopvely_core::WishlistId;

use super::ProductView;

/// A user's bookmarked products.
#[derive(Debug, Clone, Serialize)]
pub struct Wishlist {
    pub id: WishlistId,
    /// Every entry has `is_in_wishlist` set.
    pub products: Vec<ProductView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
