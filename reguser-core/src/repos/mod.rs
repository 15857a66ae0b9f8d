/*
    Repository layer - business-facing access to the store

    Repositories assign identities, stamp default permissions on users
    they hand out, relay store streams through their own buffers and tag
    every store failure with the operation that produced it.
*/

pub mod errors;
pub mod groups;
pub mod membership;
pub mod relay;
pub mod users;

pub use errors::{RepoError, RepoResult};
pub use groups::Groups;
pub use membership::MembershipMapper;
pub use relay::RELAY_BUFFER;
pub use users::Users;

use crate::config::StoreConfig;
use crate::model::{User, DEFAULT_PERMISSIONS};
use crate::store::MemStore;
use std::sync::Arc;

pub(crate) fn stamp_permissions(mut user: User) -> User {
    user.permissions = DEFAULT_PERMISSIONS;
    user
}

/// The three repositories over one shared store
#[derive(Debug, Clone)]
pub struct Registry {
    pub users: Users,
    pub groups: Groups,
    pub membership: MembershipMapper,
    store: Arc<MemStore>,
}

impl Registry {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_store(Arc::new(MemStore::with_config(config)))
    }

    pub fn with_store(store: Arc<MemStore>) -> Self {
        Registry {
            users: Users::new(store.clone()),
            groups: Groups::new(store.clone()),
            membership: MembershipMapper::new(store.clone()),
            store,
        }
    }

    /// The shared backing store
    pub fn store(&self) -> &Arc<MemStore> {
        &self.store
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
