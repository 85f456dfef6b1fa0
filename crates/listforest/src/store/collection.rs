use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::normalize::PageMeta;

static REVISIONS: AtomicU64 = AtomicU64::new(1);

/// A fresh revision stamp, unique for the lifetime of the process.
pub(crate) fn next_revision() -> u64 {
    REVISIONS.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadMeta {
    pub is_loading: bool,
    pub page: PageMeta,
}

/// One entity map plus its loading state.
///
/// The map sits behind an `Arc`: cloning a collection is cheap, and every
/// change goes through [`Collection::update`], which copies the map only if
/// another snapshot still shares it. Each change gets a new revision stamp, so
/// two collections with equal revisions hold the same entities.
#[derive(Debug, Clone)]
pub struct Collection<K, V> {
    things: Arc<HashMap<K, V>>,
    revision: u64,
    pub meta: LoadMeta,
}

impl<K, V> Default for Collection<K, V> {
    fn default() -> Self {
        Self {
            things: Arc::new(HashMap::new()),
            revision: next_revision(),
            meta: LoadMeta::default(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Collection<K, V> {
    pub fn get(&self, id: &K) -> Option<&V> {
        self.things.get(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.things.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.things.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.things.iter()
    }

    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.things
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns a copy of this collection with `f` applied to its map.
    pub fn update(&self, f: impl FnOnce(&mut HashMap<K, V>)) -> Self {
        let mut things = Arc::clone(&self.things);
        f(Arc::make_mut(&mut things));
        Self {
            things,
            revision: next_revision(),
            meta: self.meta.clone(),
        }
    }

    pub fn merged(&self, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        self.update(|things| things.extend(entries))
    }

    pub fn replaced(&self, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            things: Arc::new(entries.into_iter().collect()),
            revision: next_revision(),
            meta: self.meta.clone(),
        }
    }

    /// Copy with only the loading metadata changed. The revision is kept, so
    /// memoized views over the entities stay valid.
    pub fn with_meta(&self, meta: LoadMeta) -> Self {
        Self {
            things: Arc::clone(&self.things),
            revision: self.revision,
            meta,
        }
    }
}
