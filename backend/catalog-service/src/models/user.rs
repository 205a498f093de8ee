use crate::error::Result;
use crate::security::password::{hash_password, verify_password};

/// Account that can log in; only the Argon2 hash of the password is kept
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub hashed_password: String,
    pub role: String,
}

impl User {
    pub fn new(username: &str, password: &str, role: &str) -> Result<Self> {
        Ok(Self {
            username: username.to_string(),
            hashed_password: hash_password(password)?,
            role: role.to_string(),
        })
    }

    pub fn is_correct_password(&self, password: &str) -> bool {
        verify_password(password, &self.hashed_password).unwrap_or(false)
    }
}
