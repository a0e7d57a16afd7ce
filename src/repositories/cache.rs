//! # Cache Repository
//!
//! Append-only in-memory cache. Entries live until the process exits: there
//! is no TTL and no eviction, and a later insert under the same key replaces
//! the earlier value.

use super::Repository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a value
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Values written
    pub inserts: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Repository trait for caching operations
#[async_trait]
pub trait CacheRepository<V>: Repository
where
    V: Clone + Send + Sync + 'static,
{
    /// Look a key up, recording a hit or a miss
    async fn get(&self, key: &str) -> Option<V>;

    /// Store a value, replacing any previous one under the same key
    async fn insert(&self, key: &str, value: V);

    /// Check presence without touching the statistics
    async fn contains(&self, key: &str) -> bool;

    /// Snapshot of the statistics
    async fn cache_stats(&self) -> CacheStats;
}

/// In-memory implementation of [`CacheRepository`]
///
/// Cloning yields a handle onto the same underlying map.
#[derive(Debug, Clone)]
pub struct InMemoryCacheRepository<V> {
    name: String,
    entries: Arc<RwLock<HashMap<String, V>>>,
    stats: Arc<RwLock<CacheStats>>,
}

impl<V> InMemoryCacheRepository<V> {
    /// Create an empty cache; `name` only appears in logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }
}

#[async_trait]
impl<V> Repository for InMemoryCacheRepository<V>
where
    V: Send + Sync + std::fmt::Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl<V> CacheRepository<V> for InMemoryCacheRepository<V>
where
    V: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.read().await.get(key).cloned();

        let mut stats = self.stats.write().await;
        if value.is_some() {
            stats.hits += 1;
            debug!("{} cache hit for key: {}", self.name, key);
        } else {
            stats.misses += 1;
            debug!("{} cache miss for key: {}", self.name, key);
        }
        value
    }

    async fn insert(&self, key: &str, value: V) {
        self.entries.write().await.insert(key.to_string(), value);
        self.stats.write().await.inserts += 1;
        debug!("{} cache stored key: {}", self.name, key);
    }

    async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    async fn cache_stats(&self) -> CacheStats {
        *self.stats.read().await
    }
}
