use crate::client::PaperMetadata;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Search query parameters for a provider
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query string
    pub query: String,
    /// Maximum results to return
    pub max_results: u32,
    /// Search offset for pagination
    pub offset: u32,
    /// Result ordering
    pub sort_by: SortBy,
}

/// Result ordering understood by the arXiv API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SortBy {
    #[default]
    #[serde(rename = "relevance")]
    Relevance,
    #[serde(rename = "lastUpdatedDate")]
    LastUpdatedDate,
    #[serde(rename = "submittedDate")]
    SubmittedDate,
}

impl SortBy {
    /// Value of the `sortBy` query parameter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::LastUpdatedDate => "lastUpdatedDate",
            Self::SubmittedDate => "submittedDate",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context for search operations
#[derive(Debug, Clone)]
pub struct SearchContext {
    /// Timeout for the search operation
    pub timeout: Duration,
}

impl SearchContext {
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Result from a source provider
#[derive(Debug, Clone)]
pub struct ProviderResult {
    /// Papers found by the provider
    pub papers: Vec<PaperMetadata>,
    /// Source that provided the results
    pub source: String,
    /// Time taken to execute the search
    pub search_time: Duration,
    /// Whether there are more results available
    pub has_more: bool,
}

/// Errors that can occur during provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Provider error: {0}")]
    Other(String),
}

/// Upstream producer of paper metadata records
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Unique name/identifier for this provider
    fn name(&self) -> &str;

    /// Search for papers using this provider
    async fn search(
        &self,
        query: &SearchQuery,
        context: &SearchContext,
    ) -> Result<ProviderResult, ProviderError>;

    /// Whether the upstream answers queries; rate limiting counts as reachable
    async fn health_check(&self, context: &SearchContext) -> Result<bool, ProviderError>;
}
