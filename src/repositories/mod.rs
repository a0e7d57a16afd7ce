//! # Repositories
//!
//! Process-lifetime storage behind small async traits, so the summarizer,
//! retriever and search tool never touch a map directly and tests can hand
//! each component a fresh instance.
//!
//! - [`CacheRepository`]: append-only key/value cache with hit statistics
//!
//! ## Usage Example
//!
//! ```no_run
//! use arxiv_digest::repositories::{CacheRepository, InMemoryCacheRepository};
//!
//! # async fn example() {
//! let cache: InMemoryCacheRepository<String> = InMemoryCacheRepository::new("summary");
//! cache.insert("fingerprint", "- **Point** one".to_string()).await;
//! assert!(cache.get("fingerprint").await.is_some());
//! # }
//! ```

pub mod cache;

pub use cache::{CacheRepository, CacheStats, InMemoryCacheRepository};

use async_trait::async_trait;
use std::fmt::Debug;

/// Base trait for all repositories
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Number of stored entities
    async fn len(&self) -> usize;

    /// Whether the repository holds nothing
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
