/*
    table.rs - Keyed storage for a single entity kind

    Not synchronised on its own: the owning MemStore keeps every table
    behind the same mutex as the membership index.
*/

use std::collections::HashMap;
use std::hash::Hash;

/// Hash table of entities keyed by identity.
///
/// `scan` is a linear pass over every stored value; there is no secondary
/// index on names.
#[derive(Debug, Clone)]
pub struct EntityTable<K, V> {
    rows: HashMap<K, V>,
}

impl<K, V> EntityTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        EntityTable {
            rows: HashMap::new(),
        }
    }

    /// Insert or replace the entity stored under `id`
    pub fn put(&mut self, id: K, entity: V) {
        self.rows.insert(id, entity);
    }

    /// Value copy of the entity stored under `id`
    pub fn get(&self, id: &K) -> Option<V> {
        self.rows.get(id).cloned()
    }

    /// Remove `id`; absent keys are ignored.
    pub fn delete(&mut self, id: &K) -> Option<V> {
        self.rows.remove(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.rows.contains_key(id)
    }

    /// Iterate over live rows matching `predicate`. Order is unspecified.
    pub fn scan<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a V> + 'a
    where
        P: FnMut(&V) -> bool + 'a,
    {
        self.rows.values().filter(move |v| predicate(*v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<K, V> Default for EntityTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
