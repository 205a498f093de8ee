//! Symmetric JWT issuance and verification
//!
//! Tokens are signed with HS256 using a shared secret and carry
//! [`UserClaims`]. Verification only accepts the HMAC family, so a token
//! whose header declares RS256, ES256 or any other scheme is rejected before
//! its signature is looked at.
//!
//! ## Usage
//!
//! ```rust
//! use grpc_jwt_auth::JwtManager;
//!
//! let manager = JwtManager::new("secret", chrono::Duration::minutes(15));
//! let token = manager.generate("admin1", "admin").unwrap();
//! let claims = manager.verify(&token).unwrap();
//! assert_eq!(claims.role, "admin");
//! ```

use crate::claims::UserClaims;
use crate::error::{AuthError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Algorithm used when signing new tokens
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted on verification
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Issues and verifies access tokens
///
/// Construct once at startup and share behind an `Arc`; the keys are
/// immutable after construction.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_duration: Duration,
}

impl JwtManager {
    pub fn new(secret: impl AsRef<[u8]>, token_duration: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_duration,
        }
    }

    pub fn token_duration(&self) -> Duration {
        self.token_duration
    }

    /// Generate a signed token for `username` with `role`
    ///
    /// Expiry is now + the configured token duration.
    pub fn generate(&self, username: &str, role: &str) -> Result<String> {
        let now = Utc::now();
        let expiry = now + self.token_duration;

        let claims = UserClaims {
            username: username.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify a token and return its claims
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::InvalidToken` if:
    /// - the header declares a non-HMAC algorithm
    /// - the signature does not match the secret
    /// - the token is expired
    /// - the token is malformed
    pub fn verify(&self, token: &str) -> Result<UserClaims> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<UserClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        debug!(
            username = %token_data.claims.username,
            role = %token_data.claims.role,
            "Access token verified"
        );

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("token_duration", &self.token_duration)
            .finish_non_exhaustive()
    }
}
