//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! shopvely migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPVELY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/api/migrations/` and are embedded at
//! compile time.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use super::database_url;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: SHOPVELY_DATABASE_URL")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
