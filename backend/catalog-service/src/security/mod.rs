//! Security primitives for catalog-service
//!
//! - Password hashing and verification (Argon2id)

pub mod password;

pub use password::{hash_password, verify_password};
