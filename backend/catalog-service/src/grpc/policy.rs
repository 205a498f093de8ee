//! Role policy for the catalog RPC surface

use grpc_jwt_auth::RolePolicy;

/// Method path -> roles allowed to call it
///
/// `SearchDevices` and `AuthService/Login` are absent and need no token.
pub const ACCESSIBLE_ROLES: &[(&str, &[&str])] = &[
    ("/catalog.v1.CatalogService/CreateDevice", &["admin"]),
    ("/catalog.v1.CatalogService/UploadImage", &["admin"]),
    ("/catalog.v1.CatalogService/RateDevice", &["admin", "user"]),
];

pub fn role_policy() -> RolePolicy {
    RolePolicy::from_table(ACCESSIBLE_ROLES)
}

/// Methods a client should attach its token to
pub fn auth_methods() -> impl Iterator<Item = &'static str> {
    ACCESSIBLE_ROLES.iter().map(|(method, _)| *method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_coverage() {
        let policy = role_policy();
        assert!(policy.is_covered("/catalog.v1.CatalogService/CreateDevice"));
        assert!(policy.is_covered("/catalog.v1.CatalogService/UploadImage"));
        assert!(!policy.is_covered("/catalog.v1.CatalogService/SearchDevices"));
        assert!(!policy.is_covered("/catalog.v1.AuthService/Login"));

        let rate = policy.roles_for("/catalog.v1.CatalogService/RateDevice").unwrap();
        assert!(rate.contains("user"));
        assert!(rate.contains("admin"));
    }

    #[test]
    fn test_auth_methods_match_policy() {
        assert_eq!(auth_methods().count(), ACCESSIBLE_ROLES.len());
    }
}
