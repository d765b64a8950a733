//! Shopvely API library.
//!
//! This crate provides the REST API as a library, allowing it to be tested
//! and reused by the CLI.
//!
//! # Layers
//!
//! - [`routes`] - HTTP handlers and the router
//! - [`services`] - Auth and order workflows spanning several tables
//! - [`db`] - Repositories over `PostgreSQL`
//! - [`models`] - Domain objects returned by the API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
