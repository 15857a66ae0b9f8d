//! Storage traits consumed by the repository layer
//!
//! A backend stores entities under the identity they already carry; it never
//! generates identities itself. Every method takes the caller's cancellation
//! token and must fail with `StoreError::Cancelled` if it already fired.

use super::errors::StoreResult;
use super::stream::EntityStream;
use crate::model::{Group, GroupId, User, UserId};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Storage for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist `user` under `user.id` and return that id
    async fn create_user(&self, token: &CancellationToken, user: User) -> StoreResult<UserId>;

    /// Returns `StoreError::NotFound` if missing.
    async fn read_user(&self, token: &CancellationToken, id: UserId) -> StoreResult<User>;

    /// Idempotent: succeeds whether or not the user exists.
    async fn delete_user(&self, token: &CancellationToken, id: UserId) -> StoreResult<()>;

    /// Stream every user whose name contains `query` (case-sensitive)
    async fn search_users(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> StoreResult<EntityStream<User>>;
}

/// Storage for groups
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn create_group(&self, token: &CancellationToken, group: Group) -> StoreResult<GroupId>;

    async fn read_group(&self, token: &CancellationToken, id: GroupId) -> StoreResult<Group>;

    async fn delete_group(&self, token: &CancellationToken, id: GroupId) -> StoreResult<()>;

    async fn search_groups(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> StoreResult<EntityStream<Group>>;
}

/// Storage for the user/group membership relation
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Idempotent
    async fn add_user_to_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> StoreResult<()>;

    /// Idempotent
    async fn remove_user_from_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> StoreResult<()>;

    async fn groups_of_user(
        &self,
        token: &CancellationToken,
        user: UserId,
    ) -> StoreResult<EntityStream<Group>>;

    async fn users_of_group(
        &self,
        token: &CancellationToken,
        group: GroupId,
    ) -> StoreResult<EntityStream<User>>;
}
