//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC-formatted strings with a fresh random salt per call, so
//! re-hashing the same plaintext never yields the same stored value.
//! Verification goes through the `password_hash` comparison, which does not
//! leak timing correlated with matching prefix bytes.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::error;

use crate::error::CredentialError;

/// Hash a password with a freshly generated salt.
///
/// # Errors
/// Returns [`CredentialError::Hashing`] if the hashing primitive rejects the
/// input.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialError::Hashing(err.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// A stored value that does not parse as a PHC string is fail-closed: the
/// check returns `false` and logs the condition.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        error!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
