//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <access token>`. The
//! token is resolved against the token table on every request.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Extractor that requires an authenticated staff user.
pub struct RequireStaff(pub User);

/// Extractor that optionally gets the current user.
///
/// Missing, unknown and expired tokens all yield `None`.
pub struct OptionalAuth(pub Option<User>);

/// Pull the token out of an `Authorization: Bearer` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };

    let auth = AuthService::new(state.pool(), &state.config().tokens);
    let user = auth.authenticate(token).await?;

    Span::current().record("user_id", user.id.as_i32());
    set_sentry_user(&user.id, &user.username);

    Ok(Some(user))
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(user) => Ok(Self(user)),
            Err(AppError::Auth(AuthError::InvalidToken)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/me/");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
