//! Role policy table: fully-qualified RPC method -> permitted roles

use std::collections::{HashMap, HashSet};

/// Static mapping from gRPC method path to the roles allowed to call it
///
/// Keys are full method paths as they appear on the wire, for example
/// `/catalog.v1.CatalogService/CreateDevice`. Methods absent from the table
/// are not policy-covered and pass through without authentication.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    methods: HashMap<String, HashSet<String>>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from a static table
    ///
    /// ```rust
    /// use grpc_jwt_auth::RolePolicy;
    ///
    /// const TABLE: &[(&str, &[&str])] = &[
    ///     ("/catalog.v1.CatalogService/CreateDevice", &["admin"]),
    /// ];
    /// let policy = RolePolicy::from_table(TABLE);
    /// assert!(policy.is_covered("/catalog.v1.CatalogService/CreateDevice"));
    /// ```
    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        table
            .iter()
            .fold(Self::new(), |policy, (method, roles)| {
                policy.allow(*method, roles.iter().copied())
            })
    }

    /// Allow `roles` to call `method`, extending any roles already listed
    pub fn allow<I, R>(mut self, method: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.methods
            .entry(method.into())
            .or_default()
            .extend(roles.into_iter().map(Into::into));
        self
    }

    /// Roles permitted for `method`, or `None` when the method is uncovered
    pub fn roles_for(&self, method: &str) -> Option<&HashSet<String>> {
        self.methods.get(method)
    }

    pub fn is_covered(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(&str, &[&str])] = &[
        ("/pkg.Svc/Write", &["admin"]),
        ("/pkg.Svc/Rate", &["admin", "user"]),
    ];

    #[test]
    fn test_from_table() {
        let policy = RolePolicy::from_table(TABLE);
        assert_eq!(policy.len(), 2);

        let roles = policy.roles_for("/pkg.Svc/Rate").unwrap();
        assert!(roles.contains("admin"));
        assert!(roles.contains("user"));
        assert!(policy.roles_for("/pkg.Svc/Read").is_none());
    }

    #[test]
    fn test_allow_extends_existing_entry() {
        let policy = RolePolicy::from_table(TABLE).allow("/pkg.Svc/Write", ["auditor"]);
        let roles = policy.roles_for("/pkg.Svc/Write").unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("auditor"));
    }

    #[test]
    fn test_covered_method_with_no_roles_denies_everyone() {
        let policy = RolePolicy::new().allow("/pkg.Svc/Locked", Vec::<String>::new());
        assert!(policy.is_covered("/pkg.Svc/Locked"));
        assert!(policy.roles_for("/pkg.Svc/Locked").unwrap().is_empty());
    }
}
