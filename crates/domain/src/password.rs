//! Password hashing with argon2.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::DomainError;

/// Hashes a plaintext password into an argon2 PHC string with a fresh salt.
pub(crate) fn hash(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Password(e.to_string()))
}

/// Verifies a plaintext password against a stored PHC string.
///
/// A mismatch is an `Ok(false)`, not an error; only malformed hashes and
/// internal failures error out.
pub(crate) fn verify(stored_hash: &str, password: &str) -> Result<bool, DomainError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| DomainError::Password(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DomainError::Password(e.to_string())),
    }
}
