//! Group repository

use super::errors::{RepoError, RepoResult};
use super::relay::relay;
use crate::model::{Group, GroupId};
use crate::store::{EntityStream, GroupStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Business-facing access to groups
#[derive(Clone)]
pub struct Groups {
    store: Arc<dyn GroupStore>,
}

impl Groups {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Groups { store }
    }

    pub async fn create(&self, token: &CancellationToken, mut group: Group) -> RepoResult<Group> {
        group.id = GroupId::generate();
        let id = self
            .store
            .create_group(token, group.clone())
            .await
            .map_err(RepoError::at("create group"))?;
        group.id = id;
        debug!(group_id = %id, "group created");
        Ok(group)
    }

    pub async fn read(&self, token: &CancellationToken, id: GroupId) -> RepoResult<Group> {
        self.store
            .read_group(token, id)
            .await
            .map_err(RepoError::at("read group"))
    }

    /// Read-then-delete; see `Users::delete`.
    pub async fn delete(&self, token: &CancellationToken, id: GroupId) -> RepoResult<Group> {
        let group = self
            .store
            .read_group(token, id)
            .await
            .map_err(RepoError::at("delete group"))?;
        self.store
            .delete_group(token, id)
            .await
            .map_err(RepoError::at("delete group"))?;
        Ok(group)
    }

    pub async fn search(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> RepoResult<EntityStream<Group>> {
        let inner = self
            .store
            .search_groups(token, query)
            .await
            .map_err(RepoError::at("search groups"))?;
        Ok(relay("search groups", inner, token, |g| g))
    }
}

impl std::fmt::Debug for Groups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Groups").finish_non_exhaustive()
    }
}
