//! Account route handlers: registration, profile and password change.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::AuthService;
use crate::services::auth::Registration;
use crate::state::AppState;

/// Build the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/me", get(me))
        .route("/users/change-password", post(change_password))
}

// =============================================================================
// Request Types
// =============================================================================

/// Registration request.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Password change request.
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: &'static str,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            is_staff: false,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a customer account.
///
/// POST /api/users/register
#[instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let auth = AuthService::new(state.pool(), &state.config().tokens);
    let user = auth.register(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// The caller's own profile.
///
/// GET /api/users/me
async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

/// Change the caller's password. Outstanding refresh tokens are revoked.
///
/// POST /api/users/change-password
#[instrument(skip_all, fields(user_id = %user.id))]
async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<DetailResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().tokens);
    auth.change_password(user.id, &request.old_password, &request.new_password)
        .await?;

    add_breadcrumb("auth", "Password changed", None);
    Ok(Json(DetailResponse {
        detail: "Password updated successfully.",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_never_staff() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"username": "asha", "password": "long enough", "is_staff": true}"#,
        )
        .unwrap();
        let registration = Registration::from(request);

        assert_eq!(registration.username, "asha");
        assert!(!registration.is_staff);
        assert!(registration.email.is_none());
        assert!(registration.first_name.is_empty());
    }
}
