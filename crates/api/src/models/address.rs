//! Address book types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopvely_core::{AddressId, ShippingSnapshot, ShippingSnapshotError, UserId};

/// A saved shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    #[serde(flatten)]
    pub shipping: ShippingSnapshot,
    /// At most one address per user has this set.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of a create or full-replace request.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    #[serde(flatten)]
    pub shipping: ShippingSnapshot,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Trim fields and check required ones.
    ///
    /// # Errors
    ///
    /// Returns the first blank or oversized field.
    pub fn validated(self) -> Result<Self, ShippingSnapshotError> {
        Ok(Self {
            shipping: self.shipping.normalized()?,
            is_default: self.is_default,
        })
    }
}

/// Body of a partial update. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub is_default: Option<bool>,
}

impl AddressPatch {
    /// Overlay this patch on an existing address.
    #[must_use]
    pub fn apply(self, current: &Address) -> AddressInput {
        let old = &current.shipping;
        AddressInput {
            shipping: ShippingSnapshot {
                full_name: self.full_name.unwrap_or_else(|| old.full_name.clone()),
                phone: self.phone.unwrap_or_else(|| old.phone.clone()),
                line1: self.line1.unwrap_or_else(|| old.line1.clone()),
                line2: self.line2.unwrap_or_else(|| old.line2.clone()),
                city: self.city.unwrap_or_else(|| old.city.clone()),
                state: self.state.unwrap_or_else(|| old.state.clone()),
                pincode: self.pincode.unwrap_or_else(|| old.pincode.clone()),
            },
            is_default: self.is_default.unwrap_or(current.is_default),
        }
    }
}
