//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"detail": "..."}`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart write rejected the request.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order workflow rejected the request.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::UserAlreadyExists
                | AuthError::WeakPassword(_)
                | AuthError::WrongPassword => StatusCode::BAD_REQUEST,
                AuthError::Repository(_)
                | AuthError::PasswordHash
                | AuthError::SigningKey
                | AuthError::TokenLifetime => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Cart(err) => match err {
                CartError::Quantity(_) | CartError::TotalTooLarge => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::AddressRequired
                | OrderError::EmptyCart
                | OrderError::NoItems
                | OrderError::TotalTooLarge
                | OrderError::Transition(_) => StatusCode::BAD_REQUEST,
                OrderError::AddressNotFound
                | OrderError::ProductNotFound(_)
                | OrderError::OrderNotFound
                | OrderError::ItemNotFound => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    #[must_use]
    pub fn detail(&self) -> String {
        if self.status().is_server_error() {
            return INTERNAL_MESSAGE.to_string();
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    "No active account found with the given credentials".to_string()
                }
                AuthError::InvalidToken => "Given token not valid for any token type".to_string(),
                AuthError::UserAlreadyExists => {
                    "A user with that username already exists.".to_string()
                }
                AuthError::InvalidEmail(_) => "Enter a valid email address.".to_string(),
                AuthError::InvalidUsername(msg) => (*msg).to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::WrongPassword => "Old password is not correct.".to_string(),
                _ => INTERNAL_MESSAGE.to_string(),
            },
            Self::Cart(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Request was throttled.".to_string(),
            Self::Database(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut response = (status, Json(json!({ "detail": self.detail() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order created", Some(&[("order_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopvely_core::{OrderStatus, QuantityError, StatusTransitionError};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_order_errors_map_to_detail_bodies() {
        let (status, body) = body_json(OrderError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "Cart is empty" }));

        let (status, body) = body_json(OrderError::AddressNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Address not found");

        let err = OrderError::Transition(StatusTransitionError {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        });
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "cannot change order status from shipped to cancelled"
        );
    }

    #[tokio::test]
    async fn test_totals_above_max_are_bad_requests() {
        let (status, body) = body_json(OrderError::TotalTooLarge.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "order total cannot exceed ₹99999999.99");

        let (status, body) = body_json(CartError::TotalTooLarge.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "cart total cannot exceed ₹99999999.99");
    }

    #[tokio::test]
    async fn test_cart_errors_map_to_detail_bodies() {
        let (status, body) = body_json(CartError::ItemNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Cart item not found");

        let (status, body) = body_json(CartError::Quantity(QuantityError::NotPositive).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "quantity must be positive");

        let (status, body) = body_json(CartError::Quantity(QuantityError::Overflow).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "quantity is too large");
    }

    #[tokio::test]
    async fn test_auth_errors_hide_internals() {
        let (status, body) = body_json(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["detail"],
            "No active account found with the given credentials"
        );

        let (status, body) = body_json(AuthError::PasswordHash.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn test_database_error_is_not_leaked() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret".to_string()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = AppError::Unauthorized("x".to_string()).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
