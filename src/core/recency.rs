// src/core/recency.rs

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Recency order of cache keys, least recently used first when evicting.
///
/// Every touch stamps the key with a fresh, strictly increasing tick. The tick index keeps
/// keys ordered by last use, so touching, removing, and evicting are all logarithmic even
/// for caches holding one entry per element.
#[derive(Debug, Clone)]
pub(crate) struct RecencyList<K> {
    ticks: HashMap<K, u64>,
    order: BTreeMap<u64, K>,
    next_tick: u64,
}

impl<K: Eq + Hash + Clone> RecencyList<K> {
    pub(crate) fn new() -> Self {
        Self {
            ticks: HashMap::new(),
            order: BTreeMap::new(),
            next_tick: 0,
        }
    }

    /// Moves `key` to the most-recently-used position, inserting it if needed.
    pub(crate) fn touch(&mut self, key: &K) {
        if let Some(old) = self.ticks.get(key) {
            self.order.remove(old);
        }
        let tick = self.next_tick;
        self.next_tick += 1;
        self.ticks.insert(key.clone(), tick);
        self.order.insert(tick, key.clone());
    }

    pub(crate) fn remove(&mut self, key: &K) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    /// Removes and returns the least recently used key.
    pub(crate) fn pop_lru(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub(crate) fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Keys from most to least recently used.
    pub(crate) fn iter_mru(&self) -> impl Iterator<Item = &K> {
        self.order.values().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_reorders_and_pop_returns_oldest() {
        let mut list = RecencyList::new();
        for key in ["a", "b", "c"] {
            list.touch(&key);
        }
        list.touch(&"a");

        assert_eq!(list.iter_mru().copied().collect::<Vec<_>>(), vec!["a", "c", "b"]);
        assert_eq!(list.pop_lru(), Some("b"));
        assert_eq!(list.pop_lru(), Some("c"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut list = RecencyList::new();
        list.touch(&1);
        list.touch(&2);
        list.remove(&1);
        list.remove(&42);
        assert_eq!(list.iter_mru().copied().collect::<Vec<_>>(), vec![2]);

        list.clear();
        assert_eq!(list.len(), 0);
        assert_eq!(list.pop_lru(), None);
    }
}
