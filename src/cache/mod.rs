use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-wide TTL key-value cache. Entries self-expire; concurrent set
/// races are last-writer-wins, which is acceptable for cached query results
/// since recomputing the same query is harmless.
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn instance() -> &'static CacheStore {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<CacheStore> = OnceLock::new();
        INSTANCE.get_or_init(CacheStore::new)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        // Fast path: read lock, return live entries
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but expired; drop it under the write lock
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at <= Instant::now() {
                entries.remove(key);
            }
        }
        None
    }

    pub async fn set(&self, key: &str, value: Value, ttl_ms: u64) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + Duration::from_millis(ttl_ms),
            },
        );
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
