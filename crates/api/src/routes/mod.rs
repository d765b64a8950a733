//! HTTP route handlers for the REST API.
//!
//! # Route Structure
//!
//! Trailing slashes are optional everywhere: `/api/cart/` and `/api/cart`
//! are the same route.
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (database)
//!
//! # Addresses (auth)
//! GET  /api/addresses                       - List own addresses
//! POST /api/addresses                       - Create address
//! GET  /api/addresses/{id}                  - Show address
//! PUT  /api/addresses/{id}                  - Replace address
//! PATCH /api/addresses/{id}                 - Partial update
//! DELETE /api/addresses/{id}                - Delete address
//! POST /api/addresses/{id}/set-default      - Make default
//!
//! # Cart (auth)
//! GET  /api/cart                            - Show cart
//! POST /api/cart                            - Add product {product_id, quantity}
//! PATCH /api/cart                           - Set quantity {item_id, quantity}
//! DELETE /api/cart                          - Remove line {item_id}
//! POST /api/cart/checkout                   - Cart to order {address_id}
//!
//! # Catalog
//! GET  /api/products                        - List (public, filterable)
//! POST /api/products                        - Create (staff)
//! GET  /api/products/{id}                   - Detail (public)
//! PATCH /api/products/{id}                  - Edit (staff)
//! GET/POST/DELETE /api/products/wishlist    - Wishlist (auth)
//!
//! # Orders (auth)
//! GET  /api/orders                          - List own orders
//! POST /api/orders                          - Direct order
//! GET  /api/orders/{id}                     - Detail with history
//! PATCH /api/orders/{id}/status             - Status change (staff)
//! PATCH /api/orders/{id}/items/{item_id}    - Line quantity (staff)
//! GET  /api/orders/{id}/invoice             - HTML invoice (owner or staff)
//!
//! # Accounts
//! POST /api/users/register                  - Register
//! GET  /api/users/me                        - Profile (auth)
//! POST /api/users/change-password           - Change password (auth)
//! POST /api/token                           - Obtain token pair (rate limited)
//! POST /api/token/refresh                   - Refresh access token (rate limited)
//! ```

pub mod account;
pub mod addresses;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
    routing::get,
};
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(addresses::router())
        .merge(cart::router())
        .merge(wishlist::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(account::router())
        .merge(auth::router())
}

/// Build the complete application with middleware.
///
/// The returned service strips trailing slashes before routing, so it must
/// be served directly rather than wrapped in another `Router`.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let cors = cors_layer(&state.config().cors_origins);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// CORS for the browser frontend. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found.".to_string())
}
