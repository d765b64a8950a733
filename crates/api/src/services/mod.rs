//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens, password changes
//! - `cart` - Cart writes, priced and bounded in one transaction
//! - `orders` - Checkout and order mutations, each in a single transaction

pub mod auth;
pub mod cart;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use orders::{OrderError, OrderService};
