use crate::error::{CatalogError, Result};
use crate::models::User;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

/// Login accounts keyed by username
pub trait UserStore: Send + Sync {
    /// ## Errors
    ///
    /// `AlreadyExists` when the username is taken.
    fn save(&self, user: User) -> Result<()>;

    fn find(&self, username: &str) -> Result<Option<User>>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn save(&self, user: User) -> Result<()> {
        let mut users = self.users.lock();
        if users.contains_key(&user.username) {
            return Err(CatalogError::AlreadyExists(format!(
                "user {} already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    fn find(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.lock().get(username).cloned())
    }
}

/// Demo accounts: admin1/secret (admin) and user1/secret (user)
pub fn seed_demo_users(store: &dyn UserStore) -> Result<()> {
    store.save(User::new("admin1", "secret", "admin")?)?;
    store.save(User::new("user1", "secret", "user")?)?;
    info!("Seeded demo users admin1 and user1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_find() {
        let store = InMemoryUserStore::new();
        store.save(User::new("alice", "pw", "user").unwrap()).unwrap();

        let alice = store.find("alice").unwrap().unwrap();
        assert_eq!(alice.role, "user");
        assert!(alice.is_correct_password("pw"));
        assert!(store.find("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username() {
        let store = InMemoryUserStore::new();
        store.save(User::new("alice", "pw", "user").unwrap()).unwrap();

        let err = store.save(User::new("alice", "other", "admin").unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists(_)));
        assert_eq!(store.find("alice").unwrap().unwrap().role, "user");
    }

    #[test]
    fn test_seed_demo_users() {
        let store = InMemoryUserStore::new();
        seed_demo_users(&store).unwrap();

        assert_eq!(store.find("admin1").unwrap().unwrap().role, "admin");
        assert_eq!(store.find("user1").unwrap().unwrap().role, "user");
    }
}
