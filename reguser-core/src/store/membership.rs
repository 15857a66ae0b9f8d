/*
    membership.rs - Bidirectional user/group adjacency

    Both directions are mutated together by every operation here, so a
    caller holding the store lock always observes a consistent pair.
*/

use crate::model::{GroupId, UserId};
use std::collections::{HashMap, HashSet};

/// Many-to-many relation between users and groups.
#[derive(Debug, Default, Clone)]
pub struct MembershipIndex {
    /// user -> groups
    forward: HashMap<UserId, HashSet<GroupId>>,
    /// group -> users
    reverse: HashMap<GroupId, HashSet<UserId>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge in both directions. Re-linking is a no-op.
    pub fn link(&mut self, user: UserId, group: GroupId) {
        self.forward.entry(user).or_default().insert(group);
        self.reverse.entry(group).or_default().insert(user);
    }

    /// Remove the edge in both directions. Unknown edges are ignored.
    pub fn unlink(&mut self, user: &UserId, group: &GroupId) {
        if let Some(groups) = self.forward.get_mut(user) {
            groups.remove(group);
            if groups.is_empty() {
                self.forward.remove(user);
            }
        }
        if let Some(users) = self.reverse.get_mut(group) {
            users.remove(user);
            if users.is_empty() {
                self.reverse.remove(group);
            }
        }
    }

    pub fn groups_of<'a>(&'a self, user: &UserId) -> impl Iterator<Item = GroupId> + 'a {
        self.forward.get(user).into_iter().flatten().copied()
    }

    pub fn users_of<'a>(&'a self, group: &GroupId) -> impl Iterator<Item = UserId> + 'a {
        self.reverse.get(group).into_iter().flatten().copied()
    }

    /// Drop every edge touching `user`, including the reverse entries held by its groups.
    pub fn remove_user(&mut self, user: &UserId) {
        if let Some(groups) = self.forward.remove(user) {
            for group in groups {
                if let Some(users) = self.reverse.get_mut(&group) {
                    users.remove(user);
                    if users.is_empty() {
                        self.reverse.remove(&group);
                    }
                }
            }
        }
    }

    /// Drop every edge touching `group`, including the forward entries held by its users.
    pub fn remove_group(&mut self, group: &GroupId) {
        if let Some(users) = self.reverse.remove(group) {
            for user in users {
                if let Some(groups) = self.forward.get_mut(&user) {
                    groups.remove(group);
                    if groups.is_empty() {
                        self.forward.remove(&user);
                    }
                }
            }
        }
    }

    pub fn is_linked(&self, user: &UserId, group: &GroupId) -> bool {
        self.forward
            .get(user)
            .map(|groups| groups.contains(group))
            .unwrap_or(false)
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(HashSet::len).sum()
    }
}
