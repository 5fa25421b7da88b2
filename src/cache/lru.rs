//! Bounded LRU content cache
//!
//! Entries live in an arena (`Vec<Slot>`) linked into a recency list by
//! index; an `FxHashMap` maps keys to arena slots. Freed slots are reused,
//! so the arena never grows past `capacity`.

use super::traits::ContentCache;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const NIL: usize = usize::MAX;

struct Slot {
    key: String,
    value: Arc<str>,
    prev: usize,
    next: usize,
}

struct LruState {
    slots: Vec<Slot>,
    index: FxHashMap<String, usize>,
    free: Vec<usize>,
    /// Most recently used
    head: usize,
    /// Least recently used
    tail: usize,
}

impl LruState {
    fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn remove(&mut self, idx: usize) {
        self.unlink(idx);
        let key = std::mem::take(&mut self.slots[idx].key);
        self.slots[idx].value = Arc::from("");
        self.index.remove(&key);
        self.free.push(idx);
    }

    fn evict_lru(&mut self) -> Option<String> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let key = self.slots[idx].key.clone();
        self.remove(idx);
        Some(key)
    }

    fn insert(&mut self, key: &str, value: Arc<str>) -> usize {
        let slot = Slot {
            key: key.to_string(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.index.insert(key.to_string(), idx);
        self.push_front(idx);
        idx
    }
}

/// Thread-safe LRU cache holding at most `capacity` file contents
pub struct LruContentCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruContentCache {
    /// A cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(LruState::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `key` is cached, without touching recency
    pub fn contains(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        // every mutation completes under the lock, so a poisoned list is intact
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ContentCache for LruContentCache {
    fn name(&self) -> &str {
        "lru"
    }

    fn get(&self, key: &str) -> Option<Arc<str>> {
        let mut state = self.lock();
        let idx = *state.index.get(key)?;
        state.touch(idx);
        Some(Arc::clone(&state.slots[idx].value))
    }

    fn put(&self, key: &str, value: Arc<str>) {
        let mut state = self.lock();
        if let Some(&idx) = state.index.get(key) {
            state.slots[idx].value = value;
            state.touch(idx);
            return;
        }
        if state.index.len() >= self.capacity {
            if let Some(evicted) = state.evict_lru() {
                debug!("Evicted {} from content cache", evicted);
            }
        }
        state.insert(key, value);
    }

    fn invalidate(&self, key: &str) {
        let mut state = self.lock();
        if let Some(&idx) = state.index.get(key) {
            state.remove(idx);
        }
    }

    fn clear(&self) {
        let mut state = self.lock();
        *state = LruState::new(self.capacity);
    }

    fn len(&self) -> usize {
        self.lock().index.len()
    }
}
