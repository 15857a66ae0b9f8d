//! Membership repository

use super::errors::{RepoError, RepoResult};
use super::relay::relay;
use super::stamp_permissions;
use crate::model::{Group, GroupId, User, UserId};
use crate::store::{EntityStream, MembershipStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Maps users to the groups they belong to, and back
#[derive(Clone)]
pub struct MembershipMapper {
    store: Arc<dyn MembershipStore>,
}

impl MembershipMapper {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        MembershipMapper { store }
    }

    /// Idempotent. Neither entity is checked for existence here.
    pub async fn add_user_to_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> RepoResult<()> {
        self.store
            .add_user_to_group(token, user, group)
            .await
            .map_err(RepoError::at("add user to group"))
    }

    pub async fn remove_user_from_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> RepoResult<()> {
        self.store
            .remove_user_from_group(token, user, group)
            .await
            .map_err(RepoError::at("remove user from group"))
    }

    pub async fn groups_of_user(
        &self,
        token: &CancellationToken,
        user: UserId,
    ) -> RepoResult<EntityStream<Group>> {
        let inner = self
            .store
            .groups_of_user(token, user)
            .await
            .map_err(RepoError::at("groups of user"))?;
        Ok(relay("groups of user", inner, token, |g| g))
    }

    pub async fn users_of_group(
        &self,
        token: &CancellationToken,
        group: GroupId,
    ) -> RepoResult<EntityStream<User>> {
        let inner = self
            .store
            .users_of_group(token, group)
            .await
            .map_err(RepoError::at("users of group"))?;
        Ok(relay("users of group", inner, token, stamp_permissions))
    }
}

impl std::fmt::Debug for MembershipMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipMapper").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_PERMISSIONS;
    use crate::repos::Registry;
    use crate::store::ErrorKind;

    #[tokio::test]
    async fn test_link_and_unlink() {
        let registry = Registry::default();
        let token = CancellationToken::new();

        let alice = registry.users.create(&token, User::new("alice", "")).await.unwrap();
        let admins = registry.groups.create(&token, Group::new("admins")).await.unwrap();

        registry
            .membership
            .add_user_to_group(&token, alice.id, admins.id)
            .await
            .unwrap();

        let groups = registry
            .membership
            .groups_of_user(&token, alice.id)
            .await
            .unwrap()
            .collect_all()
            .await;
        assert_eq!(groups, vec![admins.clone()]);

        let users = registry
            .membership
            .users_of_group(&token, admins.id)
            .await
            .unwrap()
            .collect_all()
            .await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, alice.id);
        assert_eq!(users[0].permissions, DEFAULT_PERMISSIONS);

        registry
            .membership
            .remove_user_from_group(&token, alice.id, admins.id)
            .await
            .unwrap();
        let users = registry
            .membership
            .users_of_group(&token, admins.id)
            .await
            .unwrap()
            .collect_all()
            .await;
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_link_reports_operation() {
        let registry = Registry::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = registry
            .membership
            .add_user_to_group(&token, UserId::generate(), GroupId::generate())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.to_string(), "add user to group: Operation cancelled");
    }
}
