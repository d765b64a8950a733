//! Opaque bearer token generation and digests.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a new random token, URL-safe base64 without padding.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex HMAC-SHA256 of a token under the server secret.
///
/// This is what gets stored and looked up.
///
/// # Errors
///
/// Returns `AuthError::SigningKey` if the MAC rejects the key.
pub fn token_digest(secret: &SecretString, token: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| AuthError::SigningKey)?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
