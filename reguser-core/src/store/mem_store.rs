/*
    mem_store.rs - In-memory storage engine

    One mutex guards both entity tables and the membership index; every
    operation is linearizable on its own, multi-call sequences are not.

    Streams are produced snapshot-then-release: matching entities are
    copied while the lock is held and sent by a background task after it
    has been released, so a slow consumer never blocks other callers.
*/

use super::errors::{handle_poison, StoreError, StoreResult};
use super::membership::MembershipIndex;
use super::stream::{spawn_producer, EntityStream};
use super::table::EntityTable;
use super::traits::{GroupStore, MembershipStore, UserStore};
use crate::config::StoreConfig;
use crate::metrics;
use crate::model::{Group, GroupId, Named, User, UserId};
use async_trait::async_trait;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Everything behind the store lock
#[derive(Debug, Default)]
struct Tables {
    users: EntityTable<UserId, User>,
    groups: EntityTable<GroupId, Group>,
    membership: MembershipIndex,
}

/// Point-in-time counters, mostly for logs and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub users: usize,
    pub groups: usize,
    pub memberships: usize,
}

/// Mutex-protected store for users, groups and their memberships
#[derive(Debug)]
pub struct MemStore {
    tables: Mutex<Tables>,
    config: StoreConfig,
}

/// Fail fast if the caller already gave up
fn ensure_active(token: &CancellationToken) -> StoreResult<()> {
    if token.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Case-sensitive substring match on names, copied out of the table
fn name_matches<K, V>(table: &EntityTable<K, V>, query: &str) -> Vec<V>
where
    K: Eq + Hash,
    V: Named + Clone,
{
    table.scan(|e| e.name().contains(query)).cloned().collect()
}

impl MemStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        MemStore {
            tables: Mutex::new(Tables::default()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(handle_poison)
    }

    /// Check the token, then take the lock
    fn begin(
        &self,
        token: &CancellationToken,
        op: &'static str,
    ) -> StoreResult<MutexGuard<'_, Tables>> {
        ensure_active(token)?;
        metrics::record_store_op(op);
        self.lock()
    }

    fn stream<T: Send + 'static>(
        &self,
        op: &'static str,
        items: Vec<T>,
        token: &CancellationToken,
    ) -> EntityStream<T> {
        trace!(op, matched = items.len(), "starting result stream");
        spawn_producer(
            op,
            items,
            token,
            self.config.search_timeout,
            self.config.stream_buffer,
        )
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let tables = self.lock()?;
        Ok(StoreStats {
            users: tables.users.len(),
            groups: tables.groups.len(),
            memberships: tables.membership.edge_count(),
        })
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn create_user(&self, token: &CancellationToken, user: User) -> StoreResult<UserId> {
        let mut tables = self.begin(token, "create_user")?;
        let id = user.id;
        tables.users.put(id, user);
        debug!(user_id = %id, "user stored");
        Ok(id)
    }

    async fn read_user(&self, token: &CancellationToken, id: UserId) -> StoreResult<User> {
        let tables = self.begin(token, "read_user")?;
        tables
            .users
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn delete_user(&self, token: &CancellationToken, id: UserId) -> StoreResult<()> {
        let mut tables = self.begin(token, "delete_user")?;
        if tables.users.delete(&id).is_some() {
            debug!(user_id = %id, "user deleted");
        }
        tables.membership.remove_user(&id);
        Ok(())
    }

    async fn search_users(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> StoreResult<EntityStream<User>> {
        let matches: Vec<User> = {
            let tables = self.begin(token, "search_users")?;
            name_matches(&tables.users, query)
        };
        Ok(self.stream("search_users", matches, token))
    }
}

#[async_trait]
impl GroupStore for MemStore {
    async fn create_group(&self, token: &CancellationToken, group: Group) -> StoreResult<GroupId> {
        let mut tables = self.begin(token, "create_group")?;
        let id = group.id;
        tables.groups.put(id, group);
        debug!(group_id = %id, "group stored");
        Ok(id)
    }

    async fn read_group(&self, token: &CancellationToken, id: GroupId) -> StoreResult<Group> {
        let tables = self.begin(token, "read_group")?;
        tables
            .groups
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("group {}", id)))
    }

    async fn delete_group(&self, token: &CancellationToken, id: GroupId) -> StoreResult<()> {
        let mut tables = self.begin(token, "delete_group")?;
        if tables.groups.delete(&id).is_some() {
            debug!(group_id = %id, "group deleted");
        }
        tables.membership.remove_group(&id);
        Ok(())
    }

    async fn search_groups(
        &self,
        token: &CancellationToken,
        query: &str,
    ) -> StoreResult<EntityStream<Group>> {
        let matches: Vec<Group> = {
            let tables = self.begin(token, "search_groups")?;
            name_matches(&tables.groups, query)
        };
        Ok(self.stream("search_groups", matches, token))
    }
}

#[async_trait]
impl MembershipStore for MemStore {
    async fn add_user_to_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> StoreResult<()> {
        let mut tables = self.begin(token, "add_user_to_group")?;
        tables.membership.link(user, group);
        debug!(user_id = %user, group_id = %group, "membership added");
        Ok(())
    }

    async fn remove_user_from_group(
        &self,
        token: &CancellationToken,
        user: UserId,
        group: GroupId,
    ) -> StoreResult<()> {
        let mut tables = self.begin(token, "remove_user_from_group")?;
        tables.membership.unlink(&user, &group);
        debug!(user_id = %user, group_id = %group, "membership removed");
        Ok(())
    }

    async fn groups_of_user(
        &self,
        token: &CancellationToken,
        user: UserId,
    ) -> StoreResult<EntityStream<Group>> {
        let groups: Vec<Group> = {
            let tables = self.begin(token, "groups_of_user")?;
            tables
                .membership
                .groups_of(&user)
                .filter_map(|id| tables.groups.get(&id))
                .collect()
        };
        Ok(self.stream("groups_of_user", groups, token))
    }

    async fn users_of_group(
        &self,
        token: &CancellationToken,
        group: GroupId,
    ) -> StoreResult<EntityStream<User>> {
        let users: Vec<User> = {
            let tables = self.begin(token, "users_of_group")?;
            tables
                .membership
                .users_of(&group)
                .filter_map(|id| tables.users.get(&id))
                .collect()
        };
        Ok(self.stream("users_of_group", users, token))
    }
}
