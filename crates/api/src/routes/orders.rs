//! Order route handlers.
//!
//! # Access
//!
//! - Customers list, create and read their own orders.
//! - Staff change status and edit line quantities on any order.
//! - The HTML invoice is visible to the order's owner and to staff.
//!
//! Orders owned by someone else are reported as not found.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use shopvely_core::{
    AddressId, Money, MoneyError, OrderId, OrderItemId, OrderStatus, ProductId, Quantity,
    ShippingSnapshot, StatusTransition, UserId,
};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::{OrderDetail, OrderItem, StatusHistoryEntry, User};
use crate::services::OrderService;
use crate::state::AppState;

const NOT_FOUND: &str = "Order not found.";

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index).post(create))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", patch(update_status))
        .route("/orders/{id}/items/{item_id}", patch(update_item))
        .route("/orders/{id}/invoice", get(invoice))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// One line of a direct order.
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Direct order creation request. Prices always come from the catalog.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub address_id: Option<AddressId>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Line quantity change request. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct ItemQuantityRequest {
    pub quantity: i32,
}

/// An order as returned by the API, shipping snapshot flattened.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_full_name: String,
    pub shipping_phone: String,
    pub shipping_line1: String,
    pub shipping_line2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub items: Vec<OrderItem>,
    /// Newest first. Empty in list responses.
    pub status_history: Vec<StatusHistoryEntry>,
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        let OrderDetail {
            order,
            items,
            history,
        } = detail;
        let ShippingSnapshot {
            full_name,
            phone,
            line1,
            line2,
            city,
            state,
            pincode,
        } = order.shipping;

        Self {
            id: order.id,
            user: order.user_id,
            created_at: order.created_at,
            status: order.status,
            total_amount: order.total_amount,
            shipping_full_name: full_name,
            shipping_phone: phone,
            shipping_line1: line1,
            shipping_line2: line2,
            shipping_city: city,
            shipping_state: state,
            shipping_pincode: pincode,
            items,
            status_history: history,
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A priced line on the invoice.
#[derive(Debug)]
pub struct InvoiceLine {
    pub title: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub subtotal: Money,
}

/// Printable invoice page.
#[derive(Template)]
#[template(path = "orders/invoice.html")]
pub struct InvoiceTemplate {
    pub number: OrderId,
    pub placed_on: String,
    pub status: &'static str,
    pub shipping: ShippingSnapshot,
    pub lines: Vec<InvoiceLine>,
    pub total: Money,
}

impl TryFrom<OrderDetail> for InvoiceTemplate {
    type Error = MoneyError;

    fn try_from(detail: OrderDetail) -> std::result::Result<Self, Self::Error> {
        let lines = detail
            .items
            .iter()
            .map(|item| {
                Ok(InvoiceLine {
                    title: item.product_title.clone(),
                    unit_price: item.price,
                    quantity: item.quantity.get(),
                    subtotal: item.subtotal()?,
                })
            })
            .collect::<std::result::Result<_, MoneyError>>()?;

        Ok(Self {
            number: detail.order.id,
            placed_on: detail.order.created_at.format("%d %b %Y, %H:%M UTC").to_string(),
            status: detail.order.status.label(),
            shipping: detail.order.shipping,
            lines,
            total: detail.order.total_amount,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn load(state: &AppState, id: OrderId, owner: Option<UserId>) -> Result<OrderDetail> {
    OrderRepository::new(state.pool())
        .get_detail(id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// List the caller's orders, newest first.
///
/// GET /api/orders
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Place an order for explicit products without going through the cart.
///
/// POST /api/orders
#[instrument(skip(state, user, request), fields(items = request.items.len()))]
async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let lines: Vec<(ProductId, Quantity)> = request
        .items
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();

    let order_id = OrderService::new(state.pool())
        .create(user.id, request.address_id, &lines)
        .await?;

    let detail = load(&state, order_id, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Show one of the caller's orders with its status history.
///
/// GET /api/orders/{id}
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let detail = load(&state, id, Some(user.id)).await?;
    Ok(Json(detail.into()))
}

/// Move an order along its lifecycle. Staff only.
///
/// PATCH /api/orders/{id}/status
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
async fn update_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<OrderId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<OrderResponse>> {
    let transition = OrderService::new(state.pool())
        .change_status(id, request.status, staff.id)
        .await?;

    if transition == StatusTransition::Unchanged {
        info!(order_id = %id, status = %request.status, "Order status unchanged");
    }

    let detail = load(&state, id, None).await?;
    Ok(Json(detail.into()))
}

/// Change the quantity of one line and recompute the total. Staff only.
///
/// PATCH /api/orders/{id}/items/{item_id}
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
async fn update_item(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path((id, item_id)): Path<(OrderId, OrderItemId)>,
    ApiJson(request): ApiJson<ItemQuantityRequest>,
) -> Result<Json<OrderResponse>> {
    OrderService::new(state.pool())
        .update_item(id, item_id, request.quantity)
        .await?;

    let detail = load(&state, id, None).await?;
    Ok(Json(detail.into()))
}

/// Render the invoice as HTML.
///
/// GET /api/orders/{id}/invoice
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn invoice(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Html<String>> {
    let owner = invoice_owner_scope(&user);
    let detail = load(&state, id, owner).await?;

    let html = InvoiceTemplate::try_from(detail)
        .map_err(|e| AppError::Internal(format!("order {id} line out of range: {e}")))?
        .render()
        .map_err(|e| AppError::Internal(format!("invoice render failed: {e}")))?;
    Ok(Html(html))
}

/// Staff may read any invoice; everyone else only their own.
const fn invoice_owner_scope(user: &User) -> Option<UserId> {
    if user.is_staff { None } else { Some(user.id) }
}
