//! Keyed TTL memoization placed in front of each collector.
//!
//! Concurrent first callers may each compute (no stampede protection); an
//! expired entry is never served.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, or run `compute` once and store its result.
    /// The lock is not held while computing.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        {
            let entries = self.entries.lock().await;
            if let Some(e) = entries.get(&key) {
                if e.is_fresh(Instant::now()) {
                    return e.value.clone();
                }
            }
        }
        let value = compute().await;
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, e| e.is_fresh(now));
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                expires_at: now + self.ttl,
            },
        );
        value
    }

    pub async fn invalidate(&self) {
        self.entries.lock().await.clear();
    }
}

/// Zero-argument collector memoized for one TTL window.
pub type Cached<V> = TtlCache<(), V>;
