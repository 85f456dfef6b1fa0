use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Single-entry cache: remembers the last key and the value computed for it.
///
/// Keys are built from collection revisions plus any arguments, so a hit means
/// the inputs are exactly the ones the cached value was computed from.
#[derive(Debug)]
pub struct Memo<K, V> {
    name: &'static str,
    slot: Mutex<Option<(K, Arc<V>)>>,
    misses: AtomicUsize,
}

impl<K: PartialEq + Clone, V> Memo<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_key, value)) = slot.as_ref() {
            if *cached_key == key {
                tracing::debug!(view = self.name, "view cache hit");
                return Arc::clone(value);
            }
        }
        tracing::debug!(view = self.name, "view cache miss");
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(compute());
        *slot = Some((key, Arc::clone(&value)));
        value
    }

    /// Number of recomputations so far.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recomputes_only_on_key_change() {
        let memo: Memo<u64, String> = Memo::new("test");
        let first = memo.get_or_compute(1, || "one".to_string());
        let again = memo.get_or_compute(1, || unreachable!());
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(memo.misses(), 1);

        let second = memo.get_or_compute(2, || "two".to_string());
        assert_eq!(*second, "two");
        assert_eq!(memo.misses(), 2);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let memo: Memo<u64, u64> = Memo::new("test");
        memo.get_or_compute(1, || 1);
        memo.clear();
        memo.get_or_compute(1, || 1);
        assert_eq!(memo.misses(), 2);
    }
}
