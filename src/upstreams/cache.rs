use super::Upstream;
use arc_swap::ArcSwap;
use rand::seq::IteratorRandom;
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};

/// Number of entries an [`UpstreamCache`] holds by default.
pub const DEFAULT_CAPACITY: usize = 100;

/// Upstreams resolved for one key, along with when they were resolved.
#[derive(Debug)]
struct Entry {
    refresh: Duration,
    resolved_at: Instant,
    upstreams: Arc<[Upstream]>,
}

impl Entry {
    fn fresh(&self) -> bool {
        self.resolved_at.elapsed() < self.refresh
    }
}

/// Bounded cache of resolved upstreams.
///
/// Reads of fresh entries never wait. Refreshes of stale or missing entries
/// are serialized across the whole cache, so concurrent callers asking for
/// the same stale key cause a single lookup.
///
/// Each kind of upstream source should use its own cache; the cache can be
/// shared between sources of the same kind.
#[derive(Debug)]
pub struct UpstreamCache {
    entries: ArcSwap<HashMap<String, Arc<Entry>>>,
    refresh_lock: Mutex<()>,
    capacity: usize,
}

impl Default for UpstreamCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl UpstreamCache {
    /// Creates a cache holding at most [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Default::default(),
            refresh_lock: Mutex::new(()),
            capacity: capacity.max(1),
        }
    }

    /// Number of cached entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_fresh(&self, key: &str) -> Option<Arc<[Upstream]>> {
        self.entries
            .load()
            .get(key)
            .filter(|entry| entry.fresh())
            .map(|entry| entry.upstreams.clone())
    }

    /// Gets the upstreams cached for `key`, calling `lookup` to resolve them
    /// again if they are missing or were resolved `refresh` or more ago.
    ///
    /// A failed lookup leaves any existing entry untouched, so the next call
    /// for the same key tries again.
    pub async fn get<F, Fut, E>(
        &self,
        key: &str,
        refresh: Duration,
        lookup: F,
    ) -> Result<Arc<[Upstream]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Upstream>, E>>,
    {
        if let Some(upstreams) = self.get_fresh(key) {
            #[cfg(feature = "log")]
            tracing::trace!(key, "upstream cache hit");
            return Ok(upstreams);
        }

        let _refreshing = self.refresh_lock.lock().await;

        // Another caller may have refreshed this key while we waited for the lock
        if let Some(upstreams) = self.get_fresh(key) {
            return Ok(upstreams);
        }

        let upstreams: Arc<[Upstream]> = lookup().await?.into();

        let mut entries = HashMap::clone(&self.entries.load());
        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let victim = entries.keys().choose(&mut rand::rng()).cloned();
            if let Some(victim) = victim {
                #[cfg(feature = "log")]
                tracing::trace!(key, evicted = %victim, "upstream cache full");
                entries.remove(&victim);
            }
        }
        entries.insert(
            key.to_owned(),
            Arc::new(Entry {
                refresh,
                resolved_at: Instant::now(),
                upstreams: upstreams.clone(),
            }),
        );
        self.entries.store(Arc::new(entries));

        Ok(upstreams)
    }
}
