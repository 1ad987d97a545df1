//! Query result cache keyed by endpoint and arguments.
//!
//! Writes never patch cached lists. They drop every entry carrying one of the
//! affected tags, and the next read refetches from the backend.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Auth,
    User,
    Driver,
    Ride,
}

impl CacheTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Auth => "auth",
            CacheTag::User => "user",
            CacheTag::Driver => "driver",
            CacheTag::Ride => "ride",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub endpoint: &'static str,
    pub args: String,
}

impl QueryKey {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            args: String::new(),
        }
    }

    pub fn with_arg(endpoint: &'static str, arg: &str) -> Self {
        Self {
            endpoint,
            args: arg.to_string(),
        }
    }
}

struct Entry {
    value: Value,
    tags: Vec<CacheTag>,
    generation: u64,
}

pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    /// Bumped by every invalidation so a read that started before a write
    /// cannot store its now-stale result afterwards.
    generation: AtomicU64,
    metrics: Metrics,
}

impl QueryCache {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            metrics,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries.get(key)?.value.clone();

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(endpoint = key.endpoint, error = %err, "dropping undecodable cache entry");
                self.entries.remove(key);
                self.refresh_gauge();
                None
            }
        }
    }

    /// Stores `value` unless the cache was invalidated after `generation` was
    /// read. Returns whether the value was stored.
    pub fn insert_if_current<T: Serialize>(
        &self,
        key: QueryKey,
        tags: &[CacheTag],
        value: &T,
        generation: u64,
    ) -> bool {
        if self.generation() != generation {
            debug!(endpoint = key.endpoint, "skipping cache fill after invalidation");
            return false;
        }

        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!(endpoint = key.endpoint, error = %err, "failed to serialize query result");
                return false;
            }
        };

        self.entries.insert(
            key.clone(),
            Entry {
                value,
                tags: tags.to_vec(),
                generation,
            },
        );

        // An invalidation that bumped the generation before its sweep could
        // have missed this entry; drop it here instead.
        let stored = self.generation() == generation;
        if !stored {
            self.entries
                .remove_if(&key, |_, entry| entry.generation == generation);
        }
        self.refresh_gauge();
        stored
    }

    /// Drops every entry carrying any of `tags`. Returns how many went.
    pub fn invalidate(&self, tags: &[CacheTag]) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.tags.iter().any(|tag| tags.contains(tag)));
        let dropped = before.saturating_sub(self.entries.len());

        for tag in tags {
            self.metrics
                .cache_invalidations_total
                .with_label_values(&[tag.as_str()])
                .inc();
        }
        self.refresh_gauge();

        debug!(?tags, dropped, "cache invalidated");
        dropped
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        self.refresh_gauge();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn refresh_gauge(&self) {
        self.metrics.query_cache_entries.set(self.entries.len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheTag, QueryCache, QueryKey};
    use crate::observability::metrics::Metrics;

    fn cache() -> QueryCache {
        QueryCache::new(Metrics::new())
    }

    #[test]
    fn hit_after_insert() {
        let cache = cache();
        let generation = cache.generation();
        assert!(cache.insert_if_current(
            QueryKey::new("rides.available"),
            &[CacheTag::Ride],
            &vec![1, 2, 3],
            generation,
        ));

        let hit: Option<Vec<i32>> = cache.get(&QueryKey::new("rides.available"));
        assert_eq!(hit, Some(vec![1, 2, 3]));
    }

    #[test]
    fn keys_distinguish_arguments() {
        let cache = cache();
        let generation = cache.generation();
        cache.insert_if_current(QueryKey::with_arg("rides.get", "a"), &[CacheTag::Ride], &"a", generation);

        let miss: Option<String> = cache.get(&QueryKey::with_arg("rides.get", "b"));
        assert!(miss.is_none());
    }

    #[test]
    fn invalidation_only_drops_matching_tags() {
        let cache = cache();
        let generation = cache.generation();
        cache.insert_if_current(QueryKey::new("rides.history"), &[CacheTag::Ride], &1, generation);
        cache.insert_if_current(QueryKey::new("users.list"), &[CacheTag::User], &2, generation);

        assert_eq!(cache.invalidate(&[CacheTag::Ride]), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get::<i32>(&QueryKey::new("users.list")).is_some());
    }

    #[test]
    fn fill_started_before_invalidation_is_discarded() {
        let cache = cache();
        let stale_generation = cache.generation();
        cache.invalidate(&[CacheTag::Ride]);

        let stored = cache.insert_if_current(
            QueryKey::new("rides.available"),
            &[CacheTag::Ride],
            &vec!["stale"],
            stale_generation,
        );
        assert!(!stored);
        assert!(cache.is_empty());
    }

    #[test]
    fn racing_invalidation_never_leaves_a_stale_fill() {
        let cache = cache();
        let key = QueryKey::new("rides.available");

        for _ in 0..500 {
            let generation = cache.generation();
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    cache.insert_if_current(key.clone(), &[CacheTag::Ride], &1, generation);
                });
                scope.spawn(|| {
                    cache.invalidate(&[CacheTag::Ride]);
                });
            });

            assert_ne!(cache.generation(), generation);
            assert!(cache.get::<i32>(&key).is_none());
        }
    }

    #[test]
    fn clear_empties_everything() {
        let cache = cache();
        let generation = cache.generation();
        cache.insert_if_current(QueryKey::new("auth.me"), &[CacheTag::Auth], &"me", generation);
        cache.clear();
        assert!(cache.is_empty());
    }
}
