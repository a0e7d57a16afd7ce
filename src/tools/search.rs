use crate::client::providers::{SearchContext, SearchQuery, SortBy, SourceProvider};
use crate::client::PaperMetadata;
use crate::repositories::{CacheRepository, InMemoryCacheRepository};
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

const MAX_QUERY_CHARS: usize = 1000;
const MAX_RESULTS_LIMIT: u32 = 100;

/// Input parameters for the paper search tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Free-text query matched against all arXiv fields
    pub query: String,
    /// Maximum number of results to return (1-100, default: 20)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Result ordering: relevance, lastUpdatedDate or submittedDate
    #[serde(default)]
    pub sort_by: SortBy,
}

const fn default_max_results() -> u32 {
    20
}

/// Result of a paper search operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// Search query that was executed
    pub query: String,
    /// Number of papers returned
    pub count: usize,
    /// Papers in the order the source ranked them
    pub papers: Vec<PaperMetadata>,
    /// Time taken by the upstream search in milliseconds (0 when served from cache)
    pub search_time_ms: u64,
    /// Whether the source reported more results beyond `max_results`
    pub has_more: bool,
}

/// Paper search tool implementation
#[derive(Clone)]
pub struct SearchTool {
    provider: Arc<dyn SourceProvider>,
    cache: InMemoryCacheRepository<SearchResult>,
    timeout: Duration,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("provider", &self.provider.name())
            .field("cache", &"InMemoryCacheRepository<SearchResult>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SearchTool {
    /// Create a new search tool
    pub fn new(provider: Arc<dyn SourceProvider>, timeout: Duration) -> Self {
        info!("Initializing paper search tool ({})", provider.name());
        Self {
            provider,
            cache: InMemoryCacheRepository::new("search"),
            timeout,
        }
    }

    /// Handle onto the result cache
    #[must_use]
    pub const fn cache(&self) -> &InMemoryCacheRepository<SearchResult> {
        &self.cache
    }

    /// Execute a paper search
    #[instrument(skip(self), fields(query = %input.query, sort_by = %input.sort_by))]
    pub async fn search_papers(&self, input: SearchInput) -> Result<SearchResult> {
        Self::validate_input(&input)?;

        let cache_key = Self::generate_cache_key(&input);
        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("Returning cached search result for query: {}", input.query);
            return Ok(SearchResult {
                search_time_ms: 0,
                ..cached
            });
        }

        let start_time = Instant::now();
        let query = SearchQuery {
            query: input.query.trim().to_string(),
            max_results: input.max_results,
            offset: 0,
            sort_by: input.sort_by,
        };

        let response = self
            .provider
            .search(&query, &SearchContext::with_timeout(self.timeout))
            .await?;

        let result = SearchResult {
            query: input.query.clone(),
            count: response.papers.len(),
            papers: response.papers,
            search_time_ms: u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
            has_more: response.has_more,
        };

        self.cache.insert(&cache_key, result.clone()).await;

        info!(
            "Search completed in {}ms, found {} results",
            result.search_time_ms, result.count
        );
        Ok(result)
    }

    /// Validate search input parameters
    fn validate_input(input: &SearchInput) -> Result<()> {
        if input.query.trim().is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }

        if input.query.chars().count() > MAX_QUERY_CHARS {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: format!("Query too long (max {MAX_QUERY_CHARS} characters)"),
            });
        }

        if input.max_results == 0 || input.max_results > MAX_RESULTS_LIMIT {
            return Err(crate::Error::InvalidInput {
                field: "max_results".to_string(),
                reason: format!("max_results must be between 1 and {MAX_RESULTS_LIMIT}"),
            });
        }

        if input.query.contains('\0') || input.query.contains('\x1b') {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: "Query contains invalid characters".to_string(),
            });
        }

        Ok(())
    }

    /// Cache key: `query:max_results:sort_by`
    fn generate_cache_key(input: &SearchInput) -> String {
        format!("{}:{}:{}", input.query, input.max_results, input.sort_by)
    }
}
