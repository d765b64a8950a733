//! Core types for Shopvely.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod shipping;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError, order_total};
pub use quantity::{Quantity, QuantityError, QuantityUpdate};
pub use shipping::{ShippingSnapshot, ShippingSnapshotError};
pub use status::*;
