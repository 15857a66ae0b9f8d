/*
    model - Entities held by the store

    Users and groups are plain value types. They are cloned across the
    store boundary; nothing outside the store holds a reference into it.
*/

pub mod types;

use serde::{Deserialize, Serialize};

pub use types::{GroupId, UserId};

/// Permission bits stamped on every user handed out by the repository layer.
pub const DEFAULT_PERMISSIONS: u32 = 0o755;

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Opaque payload supplied by the client
    pub data: String,
    /// Not stored meaningfully; recomputed on read
    pub permissions: u32,
}

impl User {
    /// Build a user that has no identity yet. The repository assigns one on create.
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        User {
            id: UserId::nil(),
            name: name.into(),
            data: data.into(),
            permissions: 0,
        }
    }
}

/// A named group of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Group {
            id: GroupId::nil(),
            name: name.into(),
        }
    }
}

/// Anything with a searchable display name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for User {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Group {
    fn name(&self) -> &str {
        &self.name
    }
}
