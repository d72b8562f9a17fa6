use crate::error::{ApiError, ApiResult};
use dashmap::DashMap;
use regex::Regex;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default lifetime of a cached value
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    timestamp: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }
}

/// Process-local TTL cache for API results.
///
/// Stale entries are replaced on the next access for their key and are never
/// evicted in the background. Concurrent misses on the same key each run the
/// underlying operation. Clones share the same entries.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value stored under `key`. A value of another type counts as a miss.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.entries.get(key)?;
        if !entry.is_live(Instant::now()) {
            return None;
        }
        entry.data.downcast_ref::<T>().cloned()
    }

    pub fn insert<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.store(key.into(), value, Instant::now(), ttl);
    }

    fn store<T>(&self, key: String, value: T, timestamp: Instant, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(
            key,
            CacheEntry {
                data: Arc::new(value),
                timestamp,
                ttl,
            },
        );
    }

    /// Return the live value for `key`, or run `operation` and cache its result.
    ///
    /// The entry's age is measured from the moment the lookup started. Errors
    /// are returned as is and never cached.
    pub async fn with_cache<T, F, Fut>(&self, key: &str, ttl: Duration, operation: F) -> ApiResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let now = Instant::now();
        if let Some(value) = self.get::<T>(key) {
            tracing::trace!(target: "api::cache", key, "Cache hit");
            return Ok(value);
        }

        tracing::trace!(target: "api::cache", key, "Cache miss");
        let value = operation().await?;
        self.store(key.to_string(), value.clone(), now, ttl);
        Ok(value)
    }

    /// Remove entries whose key matches the regular expression `pattern`,
    /// or every entry when no pattern is given
    pub fn clear(&self, pattern: Option<&str>) -> ApiResult<()> {
        match pattern {
            Some(pattern) => {
                let regex = Regex::new(pattern)
                    .map_err(|e| ApiError::validation("cache pattern", e.to_string()))?;
                self.entries.retain(|key, _| !regex.is_match(key));
                tracing::debug!(target: "api::cache", pattern, remaining = self.entries.len(), "Cleared matching cache entries");
            }
            None => {
                self.entries.clear();
                tracing::debug!(target: "api::cache", "Cleared cache");
            }
        }
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn load(cache: &ResponseCache, calls: &AtomicUsize) -> ApiResult<u32> {
        cache
            .with_cache("k", Duration::from_millis(1000), || async {
                Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn live_entries_skip_the_operation() {
        let cache = ResponseCache::new();
        let calls = AtomicUsize::new(0);

        assert_eq!(load(&cache, &calls).await.unwrap(), 0);
        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(load(&cache, &calls).await.unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(load(&cache, &calls).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = ResponseCache::new();
        let result: ApiResult<String> = cache
            .with_cache("video:1", DEFAULT_CACHE_TTL, || async {
                Err(ApiError::Network("offline".into()))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_by_pattern_keeps_other_keys() {
        let cache = ResponseCache::new();
        cache.insert("videos:list", 1u32, DEFAULT_CACHE_TTL);
        cache.insert("video:42", 2u32, DEFAULT_CACHE_TTL);
        cache.insert("actors:list", 3u32, DEFAULT_CACHE_TTL);
        cache.insert("my-video", 4u32, DEFAULT_CACHE_TTL);

        cache.clear(Some("^video")).unwrap();

        assert!(!cache.contains_key("videos:list"));
        assert!(!cache.contains_key("video:42"));
        assert_eq!(cache.get::<u32>("actors:list"), Some(3));
        assert_eq!(cache.get::<u32>("my-video"), Some(4));

        cache.clear(None).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let cache = ResponseCache::new();
        cache.insert("a", 1u32, DEFAULT_CACHE_TTL);
        assert!(matches!(
            cache.clear(Some("(")),
            Err(ApiError::Validation { .. })
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn type_mismatch_is_a_miss() {
        let cache = ResponseCache::new();
        cache.insert("k", "text".to_string(), DEFAULT_CACHE_TTL);
        assert_eq!(cache.get::<u32>("k"), None);
        assert_eq!(cache.get::<String>("k").as_deref(), Some("text"));
    }
}
