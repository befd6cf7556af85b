//! Response cache used by the composition layer.
//!
//! Keys follow `chat:response:{platform}:{query}` with the query lowercased,
//! trimmed and spaces replaced by `-`, so trivially different phrasings of the
//! same question share an entry.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::types::canonical_platform;

/// Default number of cached answers.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

pub trait ResponseCache: Send + Sync {
    fn get_response(&self, query: &str, platform: &str) -> Option<String>;
    fn store_response(&self, query: &str, platform: &str, response: &str, ttl: Duration);
}

pub fn cache_key(query: &str, platform: &str) -> String {
    let normalized = query.trim().to_lowercase().replace(' ', "-");
    format!("chat:response:{}:{}", canonical_platform(platform), normalized)
}

#[derive(Debug, Clone)]
struct CachedResponse {
    value: String,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedResponse {
    fn is_fresh(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Bounded in-process cache. The least recently used answer is evicted once
/// `capacity` is reached; expired entries read as absent and are dropped.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CachedResponse>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().map(|c| c.cap().get()).unwrap_or(0)
    }
}

impl ResponseCache for MemoryCache {
    fn get_response(&self, query: &str, platform: &str) -> Option<String> {
        let key = cache_key(query, platform);
        let mut cache = self.entries.lock().ok()?;
        let expired = match cache.get(&key) {
            Some(entry) if entry.is_fresh() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(&key);
        }
        None
    }

    fn store_response(&self, query: &str, platform: &str, response: &str, ttl: Duration) {
        let Ok(mut cache) = self.entries.lock() else {
            tracing::warn!("response cache lock poisoned; skipping store");
            return;
        };
        let entry = CachedResponse { value: response.to_string(), cached_at: Instant::now(), ttl };
        cache.put(cache_key(query, platform), entry);
    }
}
