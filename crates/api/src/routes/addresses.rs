//! Address book route handlers.
//!
//! Every route is scoped to the caller's own addresses. Someone else's
//! address ID behaves exactly like a nonexistent one.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use shopvely_core::{AddressId, ShippingSnapshotError};

use crate::db::{AddressRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, AddressPatch};
use crate::state::AppState;

const NOT_FOUND: &str = "Address not found";

/// Build the address router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list).post(create))
        .route(
            "/addresses/{id}",
            get(show).put(replace).patch(update).delete(destroy),
        )
        .route("/addresses/{id}/set-default", post(set_default))
}

fn invalid(err: &ShippingSnapshotError) -> AppError {
    AppError::BadRequest(err.to_string())
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_string()),
        other => other.into(),
    }
}

/// List the caller's addresses, default first.
///
/// GET /api/addresses
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// Add an address.
///
/// POST /api/addresses
#[instrument(skip(state, user, input))]
async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = input.validated().map_err(|e| invalid(&e))?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// GET /api/addresses/{id}
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    AddressRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// Replace every field of an address.
///
/// PUT /api/addresses/{id}
#[instrument(skip(state, user, input))]
async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<Address>> {
    let input = input.validated().map_err(|e| invalid(&e))?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await
        .map_err(not_found)?;
    Ok(Json(address))
}

/// Change some fields of an address.
///
/// PATCH /api/addresses/{id}
#[instrument(skip(state, user, patch))]
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    ApiJson(patch): ApiJson<AddressPatch>,
) -> Result<Json<Address>> {
    let repo = AddressRepository::new(state.pool());
    let current = repo
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    let input = patch.apply(&current).validated().map_err(|e| invalid(&e))?;
    let address = repo.update(user.id, id, &input).await.map_err(not_found)?;
    Ok(Json(address))
}

/// DELETE /api/addresses/{id}
#[instrument(skip(state, user))]
async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    if AddressRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(NOT_FOUND.to_string()))
    }
}

/// Make this address the caller's default.
///
/// POST /api/addresses/{id}/set-default
#[instrument(skip(state, user))]
async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await
        .map_err(not_found)?;
    Ok(Json(address))
}
