use std::time::{Duration, Instant};

use moka::future::Cache;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Short-TTL in-memory response cache backed by moka.
///
/// Entries carry their own deadline so callers can pass a per-set TTL;
/// moka's builder TTL acts as the upper bound. Safe for concurrent get/set;
/// overlapping writes to the same key are last-write-wins, which is fine
/// because entries are idempotent re-fetches of the same external data.
pub struct ResponseCache {
    inner: Cache<String, Entry>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(default_ttl)
                .build(),
            default_ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let entry = self.inner.get(key).await?;
        if Instant::now() >= entry.expires_at {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry.value)
    }

    pub async fn set(&self, key: String, value: String, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl).min(self.default_ttl);
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.inner.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
