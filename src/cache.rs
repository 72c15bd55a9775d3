//! Read-through cache in front of the directories.
//!
//! Caches single entries by key and the full listing. Any invalidation drops
//! the affected entry and the listing, and bumps a generation counter so that
//! a load which started earlier cannot put its stale result back.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{config::CacheConfig, error::AppResult};

struct Cached<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Cached<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct EntityCache<K, V> {
    entries: DashMap<K, Cached<V>>,
    listing: Mutex<Option<Cached<Vec<V>>>>,
    generation: AtomicU64,
    ttl: Duration,
    enabled: bool,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            listing: Mutex::new(None),
            generation: AtomicU64::new(0),
            ttl: config.ttl(),
            enabled: config.enabled,
        }
    }

    /// Return the cached entry, or run `load` and remember a found value
    pub async fn get_or_load<F, Fut>(&self, key: &K, load: F) -> AppResult<Option<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Option<V>>>,
    {
        if !self.enabled {
            return load().await;
        }

        if let Some(hit) = self.entries.get(key) {
            if hit.is_fresh(self.ttl) {
                return Ok(Some(hit.value.clone()));
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let loaded = load().await?;
        if let Some(ref value) = loaded {
            // Checked under the key's shard lock, see `invalidate`.
            let entry = self.entries.entry(key.clone());
            if self.generation.load(Ordering::Acquire) == generation {
                entry.insert(Cached::new(value.clone()));
            }
        }
        Ok(loaded)
    }

    /// Return the cached listing, or run `load` and remember it
    pub async fn list_or_load<F, Fut>(&self, load: F) -> AppResult<Vec<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<V>>>,
    {
        if !self.enabled {
            return load().await;
        }

        {
            let listing = self.listing.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = listing.as_ref().filter(|c| c.is_fresh(self.ttl)) {
                return Ok(cached.value.clone());
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        let loaded = load().await?;
        let mut listing = self.listing.lock().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) == generation {
            *listing = Some(Cached::new(loaded.clone()));
        }
        Ok(loaded)
    }

    /// Drop `key` and the listing
    pub fn invalidate(&self, key: &K) {
        // Bump while holding the key's shard so a refill cannot slip between
        // the bump and the removal.
        let entry = self.entries.entry(key.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Entry::Occupied(occupied) = entry {
            occupied.remove();
        }
        self.invalidate_listing();
    }

    /// Drop only the listing, e.g. after a create
    pub fn invalidate_listing(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.listing.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
