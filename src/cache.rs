use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    map: HashMap<String, Entry<V>>,
    // Insertion order of live keys; overwriting a key keeps its original slot.
    order: VecDeque<String>,
}

/// Best-effort in-process cache: fixed capacity, oldest-inserted eviction
/// (not LRU), per-entry TTL checked lazily on read. No background sweep.
/// Callers must tolerate misses; nothing correctness-bearing lives here.
pub struct SimpleCache<V> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> SimpleCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        match inner.map.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        // Expired; drop it so capacity is not held by dead entries.
        inner.map.remove(key);
        None
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap();
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        if inner.map.insert(key.to_string(), entry).is_none() {
            // remove() and lazy expiry drop map entries without touching the
            // queue; clear those leftovers so the key's slot is current and
            // the queue cannot outgrow the live set.
            inner.order.retain(|k| k != key);
            inner.order.push_back(key.to_string());
        }
        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                // Order can hold keys already dropped by lazy expiry; skip those.
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.remove(key);
    }
}
