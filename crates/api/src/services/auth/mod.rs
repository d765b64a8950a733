//! Authentication service.
//!
//! Password accounts with argon2id hashes, and opaque bearer tokens: a
//! short-lived access token sent on every request and a longer-lived refresh
//! token exchanged for new access tokens.

mod error;
pub mod tokens;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{TimeDelta, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use shopvely_core::{Email, TokenKind, UserId};

use crate::config::TokenConfig;
use crate::db::users::NewUser;
use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::User;

use self::tokens::{generate_token, token_digest};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 150;

/// Account details supplied at registration.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

/// Tokens returned on login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Authentication service.
///
/// Handles registration, login, token refresh and password changes.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    config: &'a TokenConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a TokenConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            config,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::InvalidEmail` for bad input.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let username = validate_username(&registration.username)?;
        let email = registration
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(Email::parse)
            .transpose()?;

        validate_password(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let new_user = NewUser {
            username,
            email: email.as_ref(),
            first_name: registration.first_name.trim(),
            last_name: registration.last_name.trim(),
            is_staff: registration.is_staff,
        };

        let user = self
            .users
            .create_with_password(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, is_staff = user.is_staff, "User registered");
        Ok(user)
    }

    /// Check a username and password and issue a token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let (user, password_hash) = self
            .users
            .get_with_password_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        self.tokens.delete_expired(user.id).await?;

        let pair = TokenPair {
            access: self.issue(user.id, TokenKind::Access).await?,
            refresh: self.issue(user.id, TokenKind::Refresh).await?,
        };

        info!(user_id = %user.id, "Issued token pair");
        Ok(pair)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the refresh token is unknown or expired.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let digest = token_digest(&self.config.secret, refresh_token)?;
        let user_id = self
            .tokens
            .find_active(&digest, TokenKind::Refresh)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.issue(user_id, TokenKind::Access).await
    }

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, expired, or
    /// its user no longer exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let digest = token_digest(&self.config.secret, access_token)?;
        let user_id = self
            .tokens
            .find_active(&digest, TokenKind::Access)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Change a user's password and revoke their refresh tokens.
    ///
    /// Outstanding access tokens stay valid until they expire.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongPassword` if `old_password` does not match.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::WrongPassword)?;
        verify_password(old_password, &current).map_err(|_| AuthError::WrongPassword)?;

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;

        let revoked = self.tokens.revoke_all(user_id, TokenKind::Refresh).await?;
        info!(%user_id, revoked, "Password changed");
        Ok(())
    }

    async fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.config.access_ttl,
            TokenKind::Refresh => self.config.refresh_ttl,
        };
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or(AuthError::TokenLifetime)?;

        let token = generate_token();
        let digest = token_digest(&self.config.secret, &token)?;
        self.tokens.insert(user_id, kind, &digest, expires_at).await?;

        Ok(token)
    }
}

/// Trim a username and check length and allowed characters.
///
/// Letters, digits and `@ . + - _` are allowed.
fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername("username is too long"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthError::InvalidUsername(
            "username may contain only letters, digits and @/./+/-/_",
        ));
    }
    Ok(username)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
