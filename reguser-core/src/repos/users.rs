//! User repository

use super::errors::{RepoError, RepoResult};
use super::relay::relay;
use super::stamp_permissions;
use crate::model::{User, UserId};
use crate::store::{EntityStream, UserStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Business-facing access to users
#[derive(Clone)]
pub struct Users {
    store: Arc<dyn UserStore>,
}

impl Users {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Users { store }
    }

    /// Assign a fresh id to `user` and store it. The returned user carries
    /// that id and is otherwise exactly what was passed in.
    pub async fn create(&self, token: &CancellationToken, mut user: User) -> RepoResult<User> {
        user.id = UserId::generate();
        let id = self
            .store
            .create_user(token, user.clone())
            .await
            .map_err(RepoError::at("create user"))?;
        user.id = id;
        debug!(user_id = %id, "user created");
        Ok(user)
    }

    pub async fn read(&self, token: &CancellationToken, id: UserId) -> RepoResult<User> {
        self.store
            .read_user(token, id)
            .await
            .map(stamp_permissions)
            .map_err(RepoError::at("read user"))
    }

    /// Read-then-delete: a missing user is reported as `NotFound`, unlike
    /// the idempotent store delete. Returns the user that was removed.
    pub async fn delete(&self, token: &CancellationToken, id: UserId) -> RepoResult<User> {
        let user = self
            .store
            .read_user(token, id)
            .await
            .map_err(RepoError::at("delete user"))?;
        self.store
            .delete_user(token, id)
            .await
            .map_err(RepoError::at("delete user"))?;
        Ok(stamp_permissions(user))
    }

    pub async fn search(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> RepoResult<EntityStream<User>> {
        let inner = self
            .store
            .search_users(token, query)
            .await
            .map_err(RepoError::at("search users"))?;
        Ok(relay("search users", inner, token, stamp_permissions))
    }
}

impl std::fmt::Debug for Users {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Users").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_PERMISSIONS;
    use crate::store::{ErrorKind, MemStore};

    fn users() -> Users {
        Users::new(Arc::new(MemStore::new()))
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let repo = users();
        let token = CancellationToken::new();

        let a = repo.create(&token, User::new("alice", "x")).await.unwrap();
        let b = repo.create(&token, User::new("alice", "x")).await.unwrap();

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "alice");
        assert_eq!(a.data, "x");
    }

    #[tokio::test]
    async fn test_create_ignores_supplied_id() {
        let repo = users();
        let token = CancellationToken::new();

        let mut user = User::new("carol", "");
        let supplied = UserId::generate();
        user.id = supplied;

        let created = repo.create(&token, user).await.unwrap();
        assert_ne!(created.id, supplied);
    }

    #[tokio::test]
    async fn test_read_stamps_permissions() {
        let repo = users();
        let token = CancellationToken::new();

        let created = repo.create(&token, User::new("dave", "d")).await.unwrap();
        let read = repo.read(&token, created.id).await.unwrap();

        assert_eq!(read.id, created.id);
        assert_eq!(read.permissions, DEFAULT_PERMISSIONS);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = users();
        let token = CancellationToken::new();

        let err = repo.delete(&token, UserId::generate()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.op, "delete user");
    }

    #[tokio::test]
    async fn test_delete_returns_removed_user() {
        let repo = users();
        let token = CancellationToken::new();

        let created = repo.create(&token, User::new("erin", "e")).await.unwrap();
        let removed = repo.delete(&token, created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert_eq!(removed.name, "erin");

        let err = repo.read(&token, created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_stamps_every_result() {
        let repo = users();
        let token = CancellationToken::new();

        for name in ["alice", "alicia", "bob"] {
            repo.create(&token, User::new(name, "")).await.unwrap();
        }

        let found = repo.search(&token, "ali").await.unwrap().collect_all().await;
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|u| u.permissions == DEFAULT_PERMISSIONS));
    }

    #[tokio::test]
    async fn test_cancelled_token_keeps_kind() {
        let repo = users();
        let token = CancellationToken::new();
        token.cancel();

        let err = repo.search(&token, "a").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.op, "search users");
    }
}
