//! Tag-aware read-through cache for post queries.
//!
//! Entries are keyed by the canonical request parameters and expire after a
//! short staleness window. Concurrent reads for the same key coalesce into a
//! single repository load. Mutations invalidate explicit tags that entries
//! registered under, rather than matching key patterns.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache;

use crate::errors::AppError;
use crate::models::Post;

/// Tag shared by every list-level and category entry.
pub const TAG_POSTS: &str = "posts";

/// Tag for a single post entry.
pub fn post_tag(id: &str) -> String {
    format!("post:{}", id)
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Posts(Arc<Vec<Post>>),
    Post(Arc<Post>),
    Categories(Arc<Vec<String>>),
}

/// Read-through cache with explicit tag invalidation.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<String, CacheValue>,
    tags: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

/// Staleness window for cached reads.
const TIME_TO_LIVE: Duration = Duration::from_secs(300);

impl QueryCache {
    pub fn new() -> Self {
        let tags: Arc<Mutex<HashMap<String, HashSet<String>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        // Keep the tag index in step with the cache: entries that TTL out
        // (or get displaced by capacity) must not pin their key in the index
        // forever.
        let index = tags.clone();
        let entries = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(TIME_TO_LIVE)
            .eviction_listener(move |key: Arc<String>, _value, _cause| {
                if let Ok(mut tags) = index.lock() {
                    let tag = tag_of(&key);
                    let emptied = match tags.get_mut(tag) {
                        Some(keys) => {
                            keys.remove(key.as_str());
                            keys.is_empty()
                        }
                        None => false,
                    };
                    if emptied {
                        tags.remove(tag);
                    }
                }
            })
            .build();

        Self { entries, tags }
    }

    /// Cached post list for a canonical filter key.
    pub async fn posts<F, Fut>(&self, key: String, load: F) -> Result<Arc<Vec<Post>>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Post>, AppError>>,
    {
        self.register(&key, TAG_POSTS);
        let value = self
            .entries
            .try_get_with(key.clone(), async move {
                load().await.map(|posts| CacheValue::Posts(Arc::new(posts)))
            })
            .await
            .map_err(|e| {
                self.deregister(&key, TAG_POSTS);
                shared_error(e)
            })?;

        match value {
            CacheValue::Posts(posts) => Ok(posts),
            _ => Err(AppError::Internal("cache entry type mismatch".to_string())),
        }
    }

    /// Cached single post. Misses are reported as `NotFound` and never cached.
    pub async fn post<F, Fut>(&self, id: &str, load: F) -> Result<Arc<Post>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Post>, AppError>>,
    {
        let key = post_tag(id);
        self.register(&key, &key);
        let not_found = || AppError::NotFound(format!("Post {} not found", id));

        let value = self
            .entries
            .try_get_with(key.clone(), async move {
                match load().await? {
                    Some(post) => Ok(CacheValue::Post(Arc::new(post))),
                    None => Err(not_found()),
                }
            })
            .await
            .map_err(|e| {
                self.deregister(&key, &key);
                shared_error(e)
            })?;

        match value {
            CacheValue::Post(post) => Ok(post),
            _ => Err(AppError::Internal("cache entry type mismatch".to_string())),
        }
    }

    /// Cached category list.
    pub async fn categories<F, Fut>(&self, load: F) -> Result<Arc<Vec<String>>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, AppError>>,
    {
        let key = "categories".to_string();
        self.register(&key, TAG_POSTS);
        let value = self
            .entries
            .try_get_with(key.clone(), async move {
                load()
                    .await
                    .map(|categories| CacheValue::Categories(Arc::new(categories)))
            })
            .await
            .map_err(|e| {
                self.deregister(&key, TAG_POSTS);
                shared_error(e)
            })?;

        match value {
            CacheValue::Categories(categories) => Ok(categories),
            _ => Err(AppError::Internal("cache entry type mismatch".to_string())),
        }
    }

    /// Drop every entry registered under `tag`. The next read for any of
    /// those keys refetches from the repository.
    pub async fn invalidate(&self, tag: &str) {
        let keys = {
            let mut tags = self.tags.lock().expect("tag index poisoned");
            tags.remove(tag)
        };
        if let Some(keys) = keys {
            for key in keys {
                self.entries.invalidate(&key).await;
            }
        }
    }

    fn register(&self, key: &str, tag: &str) {
        let mut tags = self.tags.lock().expect("tag index poisoned");
        tags.entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// Undo a registration for a load that produced no cache entry; such a
    /// key never gets an eviction notification.
    fn deregister(&self, key: &str, tag: &str) {
        let mut tags = self.tags.lock().expect("tag index poisoned");
        let emptied = match tags.get_mut(tag) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => false,
        };
        if emptied {
            tags.remove(tag);
        }
    }
}

/// Every key maps back to exactly one tag by shape: single-post keys are
/// their own tag, everything else lives under the list tag.
fn tag_of(key: &str) -> &str {
    if key.starts_with("post:") {
        key
    } else {
        TAG_POSTS
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesced loads share one error; unwrap the `Arc` back into an owned value.
fn shared_error(err: Arc<AppError>) -> AppError {
    (*err).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            updated_at: "2025-01-01T00:00:00+00:00".to_string(),
            title: "Title".to_string(),
            excerpt: "Excerpt".to_string(),
            content: "<p>Body</p>".to_string(),
            category: "design".to_string(),
            image_id: None,
            image_url: None,
            featured: false,
            published: true,
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_load_once() {
        let cache = QueryCache::new();
        let loads = Arc::new(AtomicUsize::new(0));

        let load = |loads: Arc<AtomicUsize>| async move {
            loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(vec![sample_post("p1")])
        };

        let (a, b) = tokio::join!(
            cache.posts("posts:all".to_string(), || load(loads.clone())),
            cache.posts("posts:all".to_string(), || load(loads.clone())),
        );

        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tag_invalidation_forces_refetch() {
        let cache = QueryCache::new();
        let loads = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let loads = loads.clone();
            cache
                .posts("posts:all".to_string(), || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                })
                .await
                .unwrap();
        }
        // Second read served from cache
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate(TAG_POSTS).await;

        let counter = loads.clone();
        cache
            .posts("posts:all".to_string(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            })
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_post_tag_does_not_affect_other_posts() {
        let cache = QueryCache::new();

        cache
            .post("p1", || async { Ok(Some(sample_post("p1"))) })
            .await
            .unwrap();
        cache
            .post("p2", || async { Ok(Some(sample_post("p2"))) })
            .await
            .unwrap();

        cache.invalidate(&post_tag("p1")).await;

        // p2 still cached: loader that would fail is never called
        let p2 = cache
            .post("p2", || async {
                Err(AppError::Internal("should not reload".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(p2.id, "p2");

        // p1 was dropped and reloads
        let p1 = cache
            .post("p1", || async { Ok(Some(sample_post("p1"))) })
            .await
            .unwrap();
        assert_eq!(p1.id, "p1");
    }

    #[tokio::test]
    async fn test_tag_index_drops_evicted_entries() {
        let cache = QueryCache::new();
        cache
            .post("p1", || async { Ok(Some(sample_post("p1"))) })
            .await
            .unwrap();
        assert!(cache.tags.lock().unwrap().contains_key("post:p1"));

        cache.entries.invalidate(&post_tag("p1")).await;
        cache.entries.run_pending_tasks().await;

        assert!(!cache.tags.lock().unwrap().contains_key("post:p1"));
    }

    #[tokio::test]
    async fn test_tag_index_drops_failed_lookups() {
        let cache = QueryCache::new();
        let err = cache
            .post("ghost", || async { Ok(None) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!cache.tags.lock().unwrap().contains_key("post:ghost"));
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found_and_not_cached() {
        let cache = QueryCache::new();

        let err = cache
            .post("ghost", || async { Ok(None) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // A later read goes back to the loader
        let post = cache
            .post("ghost", || async { Ok(Some(sample_post("ghost"))) })
            .await
            .unwrap();
        assert_eq!(post.id, "ghost");
    }
}
