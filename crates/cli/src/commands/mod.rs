//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `SHOPVELY_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first so the CLI sees the same settings as the server.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("SHOPVELY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.is_empty())
        .map(SecretString::from)
}
