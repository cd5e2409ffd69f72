//! User service proxy.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::Lookup;

/// Buyer record as returned by the User service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Read access to buyers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: UserId) -> Lookup<User>;
}

/// In-memory user directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Simulates the User service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, id: UserId) -> Lookup<User> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Lookup::Unavailable("user service unreachable".to_string());
        }
        self.users.read().await.get(&id).cloned().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_outcomes() {
        let users = InMemoryUserDirectory::new();
        users
            .insert(User::new(UserId::new(1), "Ada", "ada@example.com"))
            .await;

        assert!(users.get_user(UserId::new(1)).await.is_found());
        assert_eq!(users.get_user(UserId::new(2)).await, Lookup::NotFound);

        users.set_unavailable(true);
        assert!(matches!(
            users.get_user(UserId::new(1)).await,
            Lookup::Unavailable(_)
        ));
    }
}
