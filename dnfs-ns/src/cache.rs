//! Strict MRU/LRU resolution cache, capacity 128 (§4.5).
//!
//! `moka` is deliberately not used here: the source's cache has exact
//! MRU-on-get and evict-the-tail-on-overflow semantics, and approximating
//! that with a TinyLFU-style cache would change observable behaviour.
//! Instead this is a hand-rolled intrusive doubly linked list over a slab
//! (`Vec<Node>`), in the arena-of-owned-nodes style of the allocator's
//! [`crate`]-sibling `chain` module in the teacher repo this workspace is
//! built from.

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::Mutex;

const NONE: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

struct Inner<K, V> {
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    head: usize, // MRU
    tail: usize, // LRU
    capacity: usize,
}

/// A capacity-bounded cache with strict MRU ordering: every `get` moves
/// the hit to the head; overflow on `put` evicts the tail.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                nodes: Vec::new(),
                index: HashMap::new(),
                head: NONE,
                tail: NONE,
                capacity,
            }),
        }
    }

    /// Looks up `key`, promoting it to MRU on a hit.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let idx = *inner.index.get(key)?;
        inner.unlink(idx);
        inner.push_head(idx);
        Some(inner.nodes[idx].value.clone())
    }

    /// Inserts or overwrites `key`, evicting the LRU node if the cache is
    /// at capacity and `key` is new.
    pub async fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        if let Some(&idx) = inner.index.get(&key) {
            inner.nodes[idx].value = value;
            inner.unlink(idx);
            inner.push_head(idx);
            return;
        }
        if inner.index.len() >= inner.capacity {
            inner.evict_tail();
        }
        let idx = inner.nodes.len();
        inner.nodes.push(Node { key: key.clone(), value, prev: NONE, next: NONE });
        inner.index.insert(key, idx);
        inner.push_head(idx);
    }

    /// Drops `key` from the cache, used when its backing entry changes
    /// underneath it (e.g. a file map update).
    pub async fn remove(&self, key: &K) {
        let mut inner = self.inner.lock().await;
        if let Some(idx) = inner.index.remove(key) {
            inner.unlink(idx);
            inner.free(idx);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.index.len()
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone,
{
    fn push_head(&mut self, idx: usize) {
        self.nodes[idx].prev = NONE;
        self.nodes[idx].next = self.head;
        if self.head != NONE {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NONE {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev != NONE {
            self.nodes[prev].next = next;
        } else if self.head == idx {
            self.head = next;
        }
        if next != NONE {
            self.nodes[next].prev = prev;
        } else if self.tail == idx {
            self.tail = prev;
        }
    }

    fn evict_tail(&mut self) {
        if self.tail == NONE {
            return;
        }
        let tail = self.tail;
        self.unlink(tail);
        self.index.remove(&self.nodes[tail].key);
        self.free(tail);
    }

    /// Tombstones a slot's key/prev/next fields. The slab never compacts
    /// (entries live for the life of the process), so freed slots are
    /// simply orphaned, not reclaimed; capacity is bounded, so the slab
    /// never grows past `capacity` live entries plus tombstones.
    fn free(&mut self, idx: usize) {
        self.nodes[idx].prev = NONE;
        self.nodes[idx].next = NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_promotes_to_mru() {
        let cache = LruCache::new(2);
        cache.put("a", 1).await;
        cache.put("b", 2).await;
        cache.get(&"a").await;
        cache.put("c", 3).await; // should evict "b", the now-LRU entry
        assert_eq!(cache.get(&"b").await, None);
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"c").await, Some(3));
    }

    #[tokio::test]
    async fn overflow_evicts_tail_not_over_capacity() {
        let cache = LruCache::new(1);
        cache.put("a", 1).await;
        cache.put("b", 2).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&"a").await, None);
        assert_eq!(cache.get(&"b").await, Some(2));
    }

    #[tokio::test]
    async fn remove_drops_entry() {
        let cache = LruCache::new(4);
        cache.put("a", 1).await;
        cache.remove(&"a").await;
        assert_eq!(cache.get(&"a").await, None);
    }
}
