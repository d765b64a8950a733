//! Catalog route handlers.
//!
//! Reads are public. When the caller is signed in, every product carries
//! `is_in_wishlist` for that caller; anonymous callers always see `false`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::{info, instrument};

use shopvely_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{OptionalAuth, RequireStaff};
use crate::models::{InvalidProduct, NewProduct, Product, ProductFilter, ProductPatch, ProductView};
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

/// Build the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/{id}", get(show).patch(update))
}

fn invalid(err: &InvalidProduct) -> AppError {
    AppError::BadRequest(err.to_string())
}

/// List products, newest first.
///
/// GET /api/products?q=&min_price=&max_price=&min_rating=
async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool())
        .list(&filter, viewer.map(|user| user.id))
        .await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
async fn show(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    ProductRepository::new(state.pool())
        .get_view(id, viewer.map(|user| user.id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// Add a product to the catalog. Staff only.
///
/// POST /api/products
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = product.validated().map_err(|e| invalid(&e))?;
    let product = ProductRepository::new(state.pool()).create(&product).await?;

    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit a product. Staff only.
///
/// PATCH /api/products/{id}
#[instrument(skip(state, staff, patch), fields(staff_id = %staff.id))]
async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let products = ProductRepository::new(state.pool());
    let current = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    let product = patch.apply(&current).validated().map_err(|e| invalid(&e))?;
    let product = products.update(id, &product).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_string()),
        other => other.into(),
    })?;

    info!(product_id = %id, "Product updated");
    Ok(Json(product))
}
