//! Token issuance route handlers.
//!
//! Both routes sit behind the per-IP rate limiter because they check
//! credentials.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::token_rate_limiter;
use crate::services::AuthService;
use crate::services::auth::TokenPair;
use crate::state::AppState;

/// Build the token router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token", post(obtain))
        .route("/token/refresh", post(refresh))
        .layer(token_rate_limiter())
}

/// Username/password login.
#[derive(Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Refresh request.
#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

/// A fresh access token.
#[derive(Serialize)]
pub struct AccessResponse {
    pub access: String,
}

/// Exchange credentials for an access/refresh pair.
///
/// POST /api/token
#[instrument(skip_all, fields(username = %request.username))]
async fn obtain(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> Result<Json<TokenPair>> {
    let auth = AuthService::new(state.pool(), &state.config().tokens);
    let pair = auth.login(&request.username, &request.password).await?;
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token.
///
/// POST /api/token/refresh
#[instrument(skip_all)]
async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<AccessResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().tokens);
    let access = auth.refresh(&request.refresh).await?;
    Ok(Json(AccessResponse { access }))
}
