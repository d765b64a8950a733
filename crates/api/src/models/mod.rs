//! Domain models for the API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Most of them serialize directly as response bodies.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

pub use address::{Address, AddressInput, AddressPatch};
pub use cart::{Cart, CartEntry, CartLine};
pub use order::{Order, OrderDetail, OrderItem, StatusHistoryEntry};
pub use product::{
    InvalidProduct, NewProduct, Product, ProductFilter, ProductPatch, ProductSummary, ProductView,
};
pub use user::User;
pub use wishlist::Wishlist;
