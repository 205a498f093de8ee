//! Token claims carried by every access token
//!
//! Claims are minted by [`JwtManager::generate`](crate::JwtManager::generate)
//! and stored in request extensions by the server auth layer once the token
//! has been verified.

use serde::{Deserialize, Serialize};

/// Claims embedded in a signed access token
///
/// There is no revocation list: a token is valid as long as its signature
/// checks out and `exp` lies in the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username of the authenticated user
    pub username: String,

    /// Role used for policy decisions ("admin", "user", ...)
    pub role: String,

    /// Issued at timestamp (Unix timestamp)
    pub iat: i64,

    /// Expiration timestamp (Unix timestamp)
    pub exp: i64,
}

impl UserClaims {
    /// Check whether the token's role is one of `roles`
    pub fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        roles.into_iter().any(|role| role == self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> UserClaims {
        UserClaims {
            username: "admin1".to_string(),
            role: role.to_string(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_has_any_role() {
        let admin = claims("admin");
        assert!(admin.has_any_role(["admin"]));
        assert!(admin.has_any_role(["user", "admin"]));
        assert!(!admin.has_any_role(["user"]));
        assert!(!admin.has_any_role(std::iter::empty()));
    }

    #[test]
    fn test_role_match_is_exact() {
        assert!(!claims("Admin").has_any_role(["admin"]));
    }
}
