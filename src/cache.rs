use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rendered HTML kept between requests, keyed by viewer and page.
///
/// Entries expire after the configured TTL. Writes elsewhere in the site do
/// not invalidate entries; `clear` drops everything.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPage>>,
}

struct CachedPage {
    body: String,
    stored_at: Instant,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for a page as seen by a particular viewer. `page` is the raw
    /// `page` query value.
    pub fn key(path: &str, viewer_id: Option<i64>, page: &str) -> String {
        match viewer_id {
            Some(id) => format!("{path}|user:{id}|page:{page}"),
            None => format!("{path}|anon|page:{page}"),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(page) if page.stored_at.elapsed() < self.ttl => Some(page.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, page| page.stored_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        tracing::debug!("Page cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_stored_body_until_cleared() {
        let cache = PageCache::new(Duration::from_secs(60));
        let key = PageCache::key("/", None, "1");
        cache.insert(key.clone(), "<p>one</p>".into());
        assert_eq!(cache.get(&key).as_deref(), Some("<p>one</p>"));

        cache.clear();
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = PageCache::new(Duration::from_millis(10));
        let key = PageCache::key("/", Some(1), "1");
        cache.insert(key.clone(), "stale".into());
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert("k".into(), "v".into());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn keys_separate_viewers_and_pages() {
        assert_ne!(PageCache::key("/", None, "1"), PageCache::key("/", Some(1), "1"));
        assert_ne!(PageCache::key("/", Some(1), "1"), PageCache::key("/", Some(1), "2"));
    }
}
