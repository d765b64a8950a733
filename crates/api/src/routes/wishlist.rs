//! Wishlist route handlers.
//!
//! A wishlist is a set of bookmarked products, created on first access.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tracing::instrument;

use shopvely_core::ProductId;

use crate::db::{ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::Wishlist;
use crate::state::AppState;

/// Build the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new().route("/products/wishlist", get(show).post(add).delete(remove))
}

/// Add/remove request body.
#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    pub product_id: Option<ProductId>,
}

/// Resolve the requested product, checking it exists.
async fn requested_product(state: &AppState, request: &WishlistRequest) -> Result<ProductId> {
    let product_id = request
        .product_id
        .ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))?;

    if !ProductRepository::new(state.pool()).exists(product_id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(product_id)
}

/// GET /api/products/wishlist
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Wishlist>> {
    let wishlist = WishlistRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(wishlist))
}

/// Bookmark a product.
///
/// POST /api/products/wishlist
#[instrument(skip(state, user))]
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<WishlistRequest>,
) -> Result<(StatusCode, Json<Wishlist>)> {
    let wishlists = WishlistRepository::new(state.pool());
    let wishlist = wishlists.get_or_create(user.id).await?;
    let product_id = requested_product(&state, &request).await?;

    if !wishlists.add(wishlist.id, product_id).await? {
        return Err(AppError::BadRequest(
            "Product already in wishlist".to_string(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(wishlists.get_or_create(user.id).await?),
    ))
}

/// Drop a bookmark.
///
/// DELETE /api/products/wishlist
#[instrument(skip(state, user))]
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<WishlistRequest>,
) -> Result<Json<Wishlist>> {
    let wishlists = WishlistRepository::new(state.pool());
    let wishlist = wishlists.get_or_create(user.id).await?;
    let product_id = requested_product(&state, &request).await?;

    if !wishlists.remove(wishlist.id, product_id).await? {
        return Err(AppError::BadRequest("Product not in wishlist".to_string()));
    }

    Ok(Json(wishlists.get_or_create(user.id).await?))
}
