//! Cart route handlers.
//!
//! Each user has exactly one cart, created the first time any cart route is
//! hit. Line mutations name the line in the JSON body and always answer with
//! the whole updated cart.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopvely_core::{AddressId, CartItemId, OrderId, ProductId, Quantity};

use crate::error::{Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::{CartService, OrderService};
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show).post(add).patch(update).delete(remove))
        .route("/cart/checkout", post(checkout))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    #[serde(default = "one")]
    pub quantity: i32,
}

/// Set-quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub item_id: Option<CartItemId>,
    #[serde(default = "one")]
    pub quantity: i32,
}

/// Remove-line request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub item_id: Option<CartItemId>,
}

/// Checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: Option<AddressId>,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub detail: &'static str,
    pub order_id: OrderId,
}

const fn one() -> i32 {
    Quantity::ONE.get()
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the caller's cart.
///
/// GET /api/cart
async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).show(user.id).await?;
    Ok(Json(cart))
}

/// Add a product, or add more of one already in the cart.
///
/// POST /api/cart
#[instrument(skip(state, user))]
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<AddToCartRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool())
        .add(user.id, request.product_id, request.quantity)
        .await?;

    if let Some(product_id) = request.product_id {
        add_breadcrumb(
            "cart",
            "Product added",
            Some(&[("product_id", product_id.to_string().as_str())]),
        );
    }
    Ok(Json(cart))
}

/// Set a line's quantity; zero or less removes the line.
///
/// PATCH /api/cart
#[instrument(skip(state, user))]
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<UpdateCartRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool())
        .update(user.id, request.item_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line.
///
/// DELETE /api/cart
#[instrument(skip(state, user))]
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<RemoveFromCartRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool())
        .remove(user.id, request.item_id)
        .await?;
    Ok(Json(cart))
}

/// Turn the cart into an order shipped to one of the caller's addresses.
///
/// POST /api/cart/checkout
#[instrument(skip(state, user))]
async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let order_id = OrderService::new(state.pool())
        .checkout(user.id, request.address_id)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("order_id", order_id.to_string().as_str())]),
    );
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            detail: "Order created",
            order_id,
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let add: AddToCartRequest = serde_json::from_str(r#"{"product_id": 3}"#).unwrap();
        assert_eq!(add.product_id, Some(ProductId::new(3)));
        assert_eq!(add.quantity, 1);

        let update: UpdateCartRequest = serde_json::from_str(r#"{"item_id": 9}"#).unwrap();
        assert_eq!(update.quantity, 1);
    }

    #[test]
    fn test_missing_ids_deserialize_as_none() {
        let add: AddToCartRequest = serde_json::from_str("{}").unwrap();
        assert!(add.product_id.is_none());

        let checkout: CheckoutRequest = serde_json::from_str("{}").unwrap();
        assert!(checkout.address_id.is_none());
    }

    #[test]
    fn test_checkout_response_shape() {
        let body = serde_json::to_value(CheckoutResponse {
            detail: "Order created",
            order_id: OrderId::new(12),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "detail": "Order created", "order_id": 12 })
        );
    }
}
