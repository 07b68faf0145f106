//! Rendered post pages with time-based revalidation
//!
//! A page is generated once and then served from memory. Once older than the
//! revalidation interval it is still served, while a single background task
//! regenerates it. A slug requested for the first time gets a loading page
//! while its generation runs.
//!
//! The cache holds at most `capacity` slugs; the oldest is evicted first.

use indexmap::IndexMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::ServerError;

enum Entry {
    Generating,
    Ready {
        html: String,
        generated_at: Instant,
        regenerating: bool,
    },
    Failed(ServerError),
}

/// What the request handler should do for a slug
#[derive(Debug)]
pub enum Lookup {
    /// Serve as is
    Fresh(String),
    /// Serve as is and start a regeneration
    Stale(String),
    /// First generation running: show the loading page
    Pending,
    /// Never generated: start the first generation, show the loading page
    Miss,
    /// The first generation failed; the entry was dropped so the next
    /// request retries
    Failed(ServerError),
}

/// Entries keyed by slug, oldest first
pub struct DetailCache {
    entries: Mutex<IndexMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl DetailCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn insert(&self, entries: &mut IndexMap<String, Entry>, slug: &str, entry: Entry) {
        entries.insert(slug.to_string(), entry);
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!("Evicted post page {}", evicted);
            }
        }
    }

    /// Look up a slug, claiming the generation work when some is due
    pub async fn lookup(&self, slug: &str) -> Lookup {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(slug) else {
            self.insert(&mut entries, slug, Entry::Generating);
            return Lookup::Miss;
        };

        match entry {
            Entry::Generating => Lookup::Pending,
            Entry::Ready {
                html,
                generated_at,
                regenerating,
            } => {
                if generated_at.elapsed() < self.ttl || *regenerating {
                    Lookup::Fresh(html.clone())
                } else {
                    *regenerating = true;
                    Lookup::Stale(html.clone())
                }
            }
            Entry::Failed(_) => match entries.shift_remove(slug) {
                Some(Entry::Failed(err)) => Lookup::Failed(err),
                _ => Lookup::Miss,
            },
        }
    }

    /// Store a freshly generated page
    pub async fn store(&self, slug: &str, html: String) {
        let mut entries = self.entries.lock().await;
        let entry = Entry::Ready {
            html,
            generated_at: Instant::now(),
            regenerating: false,
        };
        self.insert(&mut entries, slug, entry);
    }

    /// Record a failed generation.
    ///
    /// A failed regeneration keeps serving the previous page; a failed first
    /// generation is reported to the next request for this slug. A slug
    /// evicted while generating is not brought back.
    pub async fn fail(&self, slug: &str, err: ServerError) {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(slug) {
            Some(Entry::Ready { regenerating, .. }) => *regenerating = false,
            Some(entry) if matches!(entry, Entry::Generating) => *entry = Entry::Failed(err),
            _ => {}
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn contains(&self, slug: &str) -> bool {
        matches!(
            self.entries.lock().await.get(slug),
            Some(Entry::Ready { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_miss_then_pending_then_fresh() {
        let cache = DetailCache::new(Duration::from_secs(60), 16);

        assert!(matches!(cache.lookup("a").await, Lookup::Miss));
        assert!(matches!(cache.lookup("a").await, Lookup::Pending));

        cache.store("a", "<p>a</p>".to_string()).await;
        match cache.lookup("a").await {
            Lookup::Fresh(html) => assert_eq!(html, "<p>a</p>"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_page_triggers_one_regeneration() {
        let cache = DetailCache::new(Duration::ZERO, 16);
        cache.store("a", "old".to_string()).await;

        assert!(matches!(cache.lookup("a").await, Lookup::Stale(ref h) if h == "old"));
        // the regeneration is already claimed
        assert!(matches!(cache.lookup("a").await, Lookup::Fresh(ref h) if h == "old"));

        cache.store("a", "new".to_string()).await;
        assert!(matches!(cache.lookup("a").await, Lookup::Stale(ref h) if h == "new"));
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_old_page() {
        let cache = DetailCache::new(Duration::ZERO, 16);
        cache.store("a", "old".to_string()).await;
        assert!(matches!(cache.lookup("a").await, Lookup::Stale(_)));

        cache
            .fail("a", ServerError::NotFound("a".to_string()))
            .await;

        assert!(matches!(cache.lookup("a").await, Lookup::Stale(ref h) if h == "old"));
    }

    #[tokio::test]
    async fn test_failed_first_generation_is_reported_once() {
        let cache = DetailCache::new(Duration::from_secs(60), 16);
        assert!(matches!(cache.lookup("gone").await, Lookup::Miss));

        cache
            .fail("gone", ServerError::NotFound("gone".to_string()))
            .await;

        assert!(matches!(
            cache.lookup("gone").await,
            Lookup::Failed(ServerError::NotFound(_))
        ));
        assert!(matches!(cache.lookup("gone").await, Lookup::Miss));
    }

    #[tokio::test]
    async fn test_failed_slugs_do_not_accumulate() {
        let cache = DetailCache::new(Duration::from_secs(60), 8);

        for i in 0..1000 {
            let slug = format!("missing-{}", i);
            assert!(matches!(cache.lookup(&slug).await, Lookup::Miss));
            cache
                .fail(&slug, ServerError::NotFound(slug.clone()))
                .await;
        }

        assert_eq!(cache.len().await, 8);
        // the newest failure is still reported
        assert!(matches!(
            cache.lookup("missing-999").await,
            Lookup::Failed(_)
        ));
        assert!(matches!(cache.lookup("missing-0").await, Lookup::Miss));
    }

    #[tokio::test]
    async fn test_evicted_slug_is_not_revived_by_failure() {
        let cache = DetailCache::new(Duration::from_secs(60), 1);
        assert!(matches!(cache.lookup("a").await, Lookup::Miss));
        assert!(matches!(cache.lookup("b").await, Lookup::Miss));

        cache.fail("a", ServerError::NotFound("a".to_string())).await;

        assert_eq!(cache.len().await, 1);
        assert!(matches!(cache.lookup("b").await, Lookup::Pending));
    }
}
