//! Argon2id password hashing for stored users

use crate::error::{CatalogError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// PHC string for `password`, salted per call
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CatalogError::Internal(format!("cannot hash password: {}", e)))
}

/// `Ok(false)` on mismatch; errors only for an unparseable stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let stored = PasswordHash::new(stored_hash)
        .map_err(|e| CatalogError::Internal(format!("stored password hash is malformed: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .map(|()| true)
        .or_else(|e| match e {
            argon2::password_hash::Error::Password => Ok(false),
            other => Err(CatalogError::Internal(format!(
                "cannot verify password: {}",
                other
            ))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret").unwrap();
        assert!(verify_password("secret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("secret", "not-a-phc-string").is_err());
    }
}
