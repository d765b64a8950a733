//! Staff user management commands.
//!
//! # Usage
//!
//! ```bash
//! shopvely admin create -u admin -e admin@example.com -p 'a long password'
//! ```
//!
//! # Environment Variables
//!
//! Reads the same configuration as the API server (`SHOPVELY_DATABASE_URL`,
//! `SHOPVELY_TOKEN_SECRET`, ...), so run it where the server's `.env` lives.

use thiserror::Error;

use shopvely_api::config::{ApiConfig, ConfigError};
use shopvely_api::db;
use shopvely_api::services::auth::{AuthError, AuthService, Registration};
use shopvely_core::UserId;

/// Errors that can occur during staff account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Registration was rejected.
    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Create a staff user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the username is taken, the password is too short, or
/// the database is unreachable.
pub async fn create_user(
    username: &str,
    email: Option<&str>,
    password: &str,
) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Creating staff user: {}", username);
    let registration = Registration {
        username: username.to_owned(),
        email: email.map(str::to_owned),
        password: password.to_owned(),
        is_staff: true,
        ..Registration::default()
    };

    let user = AuthService::new(&pool, &config.tokens)
        .register(&registration)
        .await?;

    tracing::info!(user_id = %user.id, "Staff user created");
    Ok(user.id)
}
