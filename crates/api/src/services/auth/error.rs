//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] shopvely_core::EmailError),

    /// Username blank, too long, or with disallowed characters.
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token unknown, expired, or of the wrong kind.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Username already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Old password did not match on password change.
    #[error("old password is incorrect")]
    WrongPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token secret rejected by the MAC.
    #[error("token signing key error")]
    SigningKey,

    /// Configured token lifetime does not fit a timestamp.
    #[error("token lifetime out of range")]
    TokenLifetime,
}
