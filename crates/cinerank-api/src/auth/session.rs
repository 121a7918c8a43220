//! Stored session tokens
//!
//! The token pair saved on the user document is the only pair the server
//! accepts. Overwriting it (logout, refresh) revokes whatever was issued
//! before, regardless of expiry.

use chrono::Utc;
use cinerank_core::{CineError, Result};
use cinerank_store::UserStore;
use std::sync::Arc;

pub struct SessionStore {
    users: Arc<dyn UserStore>,
}

impl SessionStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Replace the stored pair for `user_id`
    pub async fn persist(&self, user_id: &str, access: &str, refresh: &str) -> Result<()> {
        let matched = self
            .users
            .update_tokens(user_id, access, refresh, Utc::now())
            .await?;

        if !matched {
            return Err(CineError::NotFound(format!("User {user_id}")));
        }
        Ok(())
    }

    /// Revoke every token issued to `user_id`
    pub async fn clear(&self, user_id: &str) -> Result<()> {
        self.persist(user_id, "", "").await
    }

    /// Currently accepted access token, `None` for unknown users
    pub async fn current_token(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.users.find_by_user_id(user_id).await?.map(|u| u.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerank_core::{User, UserRole};
    use cinerank_store::MemoryStore;

    async fn store_with_user() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .seed_user(User {
                user_id: "u1".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: String::new(),
                role: UserRole::User,
                favourite_genres: vec![],
                token: String::new(),
                refresh_token: String::new(),
                created_at: now,
                updated_at: now,
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_persist_then_clear() {
        let store = store_with_user().await;
        let sessions = SessionStore::new(store.clone());

        sessions.persist("u1", "access", "refresh").await.unwrap();
        assert_eq!(sessions.current_token("u1").await.unwrap().as_deref(), Some("access"));
        let user = store.find_by_user_id("u1").await.unwrap().unwrap();
        assert_eq!(user.refresh_token, "refresh");

        sessions.clear("u1").await.unwrap();
        assert_eq!(sessions.current_token("u1").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let sessions = SessionStore::new(store_with_user().await);

        assert!(matches!(
            sessions.persist("nobody", "a", "r").await,
            Err(CineError::NotFound(_))
        ));
        assert_eq!(sessions.current_token("nobody").await.unwrap(), None);
    }
}
