//! Argon2 password hashing

use std::sync::OnceLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

use crate::error::AppError;

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

// Cheap parameters keep the handler tests fast
#[cfg(test)]
fn hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};
    let params = Params::new(1024, 1, 1, None).expect("valid argon2 test params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a plaintext password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = hasher();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a plaintext password against a stored PHC string
///
/// A stored hash that cannot be parsed never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    // Cost parameters are read from the stored hash
    hasher()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash with the current cost parameters that no stored account uses
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("no account has this password").unwrap_or_default())
}

/// Spend the same Argon2 work as [`verify_password`] when no account matched,
/// so a login for an unknown email takes as long as a wrong password
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, dummy_hash());
}
