//! Shopvely Core - Shared domain types.
//!
//! This crate provides the types used across all Shopvely components:
//! - `api` - REST API server (catalog, cart, checkout, orders, addresses)
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP. The order workflow's invariants that do not need
//! storage live here so they can be tested without a database:
//!
//! - the order status state machine ([`OrderStatus::transition_to`])
//! - order total arithmetic ([`order_total`])
//! - cart quantity rules ([`Quantity`], [`QuantityUpdate`])
//! - the shipping address snapshot ([`ShippingSnapshot`])
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, quantities and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
