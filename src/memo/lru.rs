use serde::Serialize;
use tracing::trace;

use std::collections::HashMap;
use std::hash::Hash;

pub const DEFAULT_CAPACITY: usize = 1000;

/// Introspection counters of a recency cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheInfo {
  pub hits: u64,
  pub misses: u64,
  pub currsize: usize,
  pub capacity: usize,
}

/// A bounded map which evicts its least recently used entry when
/// full.
///
/// Entries live in a slab and are threaded onto a doubly linked list
/// in recency order, with the most recently used entry at the head.
/// Evicted slots are reused, so the slab never grows past the
/// capacity.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
  capacity: usize,
  index: HashMap<K, usize>,
  entries: Vec<Entry<K, V>>,
  head: Option<usize>,
  tail: Option<usize>,
  hits: u64,
  misses: u64,
}

#[derive(Debug, Clone)]
struct Entry<K, V> {
  key: K,
  value: V,
  prev: Option<usize>,
  next: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
  /// A cache holding at most `capacity` entries. A capacity of zero
  /// is taken to be one.
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    LruCache {
      capacity,
      index: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
      entries: Vec::new(),
      head: None,
      tail: None,
      hits: 0,
      misses: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.index.len()
  }

  pub fn is_empty(&self) -> bool {
    self.index.is_empty()
  }

  /// Looks up `key`, counting a hit or a miss. A hit becomes the most
  /// recently used entry.
  pub fn get(&mut self, key: &K) -> Option<&V> {
    match self.index.get(key).copied() {
      Some(slot) => {
        self.hits += 1;
        self.detach(slot);
        self.push_front(slot);
        Some(&self.entries[slot].value)
      }
      None => {
        self.misses += 1;
        None
      }
    }
  }

  /// Looks up `key` without affecting recency or counters.
  pub fn peek(&self, key: &K) -> Option<&V> {
    self.index.get(key).map(|&slot| &self.entries[slot].value)
  }

  pub fn contains_key(&self, key: &K) -> bool {
    self.index.contains_key(key)
  }

  /// Stores `value` under `key` as the most recently used entry. If
  /// the cache is full, the least recently used entry is evicted
  /// first and returned.
  pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
    if let Some(&slot) = self.index.get(&key) {
      self.entries[slot].value = value;
      self.detach(slot);
      self.push_front(slot);
      return None;
    }
    if self.entries.len() < self.capacity {
      let slot = self.entries.len();
      self.entries.push(Entry { key: key.clone(), value, prev: None, next: None });
      self.index.insert(key, slot);
      self.push_front(slot);
      return None;
    }
    // Full: reuse the tail's slot for the new entry.
    let slot = self.tail.expect("full cache has a tail");
    self.detach(slot);
    let evicted_key = std::mem::replace(&mut self.entries[slot].key, key.clone());
    let evicted_value = std::mem::replace(&mut self.entries[slot].value, value);
    self.index.remove(&evicted_key);
    self.index.insert(key, slot);
    self.push_front(slot);
    trace!(capacity = self.capacity, "Evicted least recently used cache entry");
    Some((evicted_key, evicted_value))
  }

  /// Empties the cache and resets its counters.
  pub fn clear(&mut self) {
    self.index.clear();
    self.entries.clear();
    self.head = None;
    self.tail = None;
    self.hits = 0;
    self.misses = 0;
  }

  pub fn cache_info(&self) -> CacheInfo {
    CacheInfo {
      hits: self.hits,
      misses: self.misses,
      currsize: self.len(),
      capacity: self.capacity,
    }
  }

  /// Keys from most to least recently used.
  pub fn keys_by_recency(&self) -> Vec<&K> {
    let mut keys = Vec::with_capacity(self.len());
    let mut cursor = self.head;
    while let Some(slot) = cursor {
      keys.push(&self.entries[slot].key);
      cursor = self.entries[slot].next;
    }
    keys
  }

  fn detach(&mut self, slot: usize) {
    let (prev, next) = (self.entries[slot].prev, self.entries[slot].next);
    match prev {
      Some(p) => self.entries[p].next = next,
      None => self.head = next,
    }
    match next {
      Some(n) => self.entries[n].prev = prev,
      None => self.tail = prev,
    }
    self.entries[slot].prev = None;
    self.entries[slot].next = None;
  }

  fn push_front(&mut self, slot: usize) {
    self.entries[slot].next = self.head;
    self.entries[slot].prev = None;
    if let Some(h) = self.head {
      self.entries[h].prev = Some(slot);
    }
    self.head = Some(slot);
    if self.tail.is_none() {
      self.tail = Some(slot);
    }
  }
}

impl<K: Hash + Eq + Clone, V> Default for LruCache<K, V> {
  fn default() -> Self {
    LruCache::new(DEFAULT_CAPACITY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hit_and_miss_counters() {
    let mut cache = LruCache::new(2);
    assert_eq!(cache.get(&"a"), None);
    cache.insert("a", 1);
    assert_eq!(cache.get(&"a"), Some(&1));
    assert_eq!(cache.get(&"a"), Some(&1));
    assert_eq!(cache.cache_info(), CacheInfo { hits: 2, misses: 1, currsize: 1, capacity: 2 });
  }

  #[test]
  fn test_evicts_least_recently_used() {
    let mut cache = LruCache::new(2);
    cache.insert("a", 1);
    cache.insert("b", 2);
    // Touch "a" so that "b" becomes the eviction candidate.
    cache.get(&"a");
    let evicted = cache.insert("c", 3);
    assert_eq!(evicted, Some(("b", 2)));
    assert_eq!(cache.keys_by_recency(), vec![&"c", &"a"]);
    assert!(!cache.contains_key(&"b"));
  }

  #[test]
  fn test_insert_existing_key_updates_and_promotes() {
    let mut cache = LruCache::new(3);
    cache.insert(1, "one");
    cache.insert(2, "two");
    cache.insert(1, "uno");
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.peek(&1), Some(&"uno"));
    assert_eq!(cache.keys_by_recency(), vec![&1, &2]);
  }

  #[test]
  fn test_peek_does_not_promote() {
    let mut cache = LruCache::new(2);
    cache.insert(1, ());
    cache.insert(2, ());
    cache.peek(&1);
    cache.insert(3, ());
    assert!(!cache.contains_key(&1));
    assert_eq!(cache.cache_info().hits, 0);
  }

  #[test]
  fn test_size_never_exceeds_capacity() {
    let mut cache = LruCache::new(5);
    for i in 0..100 {
      cache.insert(i, i * i);
      assert!(cache.len() <= 5);
    }
    assert_eq!(cache.keys_by_recency(), vec![&99, &98, &97, &96, &95]);
  }

  #[test]
  fn test_clear_resets_everything() {
    let mut cache = LruCache::new(2);
    cache.insert(1, 1);
    cache.get(&1);
    cache.get(&2);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.cache_info(), CacheInfo { hits: 0, misses: 0, currsize: 0, capacity: 2 });
    cache.insert(3, 3);
    assert_eq!(cache.keys_by_recency(), vec![&3]);
  }

  #[test]
  fn test_zero_capacity_holds_one() {
    let mut cache = LruCache::new(0);
    cache.insert(1, 1);
    cache.insert(2, 2);
    assert_eq!(cache.capacity(), 1);
    assert_eq!(cache.keys_by_recency(), vec![&2]);
  }

  #[test]
  fn test_default_capacity() {
    let cache: LruCache<u32, u32> = LruCache::default();
    assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
  }
}
