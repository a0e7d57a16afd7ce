use super::traits::{ProviderError, ProviderResult, SearchContext, SearchQuery, SourceProvider};
use crate::client::{ArxivId, PaperMetadata};
use crate::config::ArxivConfig;
use crate::retrieval::text::collapse_whitespace as collapse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// arXiv Atom API provider
#[derive(Debug)]
pub struct ArxivProvider {
    client: Client,
    api_base: String,
    pdf_base: String,
}

impl ArxivProvider {
    /// Create a new arXiv provider with its own HTTP client
    pub fn new(config: &ArxivConfig) -> Result<Self, ProviderError> {
        let client = crate::client::build_http_client(config)
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a provider sharing an existing HTTP client
    #[must_use]
    pub fn with_client(client: Client, config: &ArxivConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.clone(),
            pdf_base: config.pdf_base.clone(),
        }
    }

    /// Build arXiv API URL for search
    fn build_search_url(&self, query: &SearchQuery) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("search_query", &format!("all:{}", query.query.trim()))
            .append_pair("start", &query.offset.to_string())
            .append_pair("max_results", &query.max_results.to_string())
            .append_pair("sortBy", query.sort_by.as_str())
            .append_pair("sortOrder", "descending");

        Ok(url.to_string())
    }

    /// Build arXiv API URL for a direct identifier lookup
    fn build_lookup_url(&self, ids: &[ArxivId]) -> Result<String, ProviderError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))?;

        let id_list = ids.iter().map(ArxivId::as_str).collect::<Vec<_>>().join(",");
        url.query_pairs_mut()
            .append_pair("id_list", &id_list)
            .append_pair("max_results", &ids.len().to_string());

        Ok(url.to_string())
    }

    /// Fetch the records for known identifiers, in feed order
    pub async fn lookup(
        &self,
        ids: &[ArxivId],
        context: &SearchContext,
    ) -> Result<Vec<PaperMetadata>, ProviderError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        info!("Looking up {} arXiv records", ids.len());
        let url = self.build_lookup_url(ids)?;
        self.fetch_feed(&url, context).await
    }

    async fn fetch_feed(
        &self,
        url: &str,
        context: &SearchContext,
    ) -> Result<Vec<PaperMetadata>, ProviderError> {
        debug!("arXiv API URL: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(context.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("arXiv request failed: {}", e);
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::Network(format!("Connection failed: {e}"))
                } else {
                    ProviderError::Network(format!("Request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => ProviderError::RateLimit,
                503 => ProviderError::ServiceUnavailable(
                    "arXiv service temporarily unavailable".to_string(),
                ),
                _ => ProviderError::Network(format!("HTTP {status}: {error_text}")),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to read response: {e}")))?;

        self.parse_response(&response_text)
    }

    /// Parse arXiv Atom feed response
    fn parse_response(&self, response_text: &str) -> Result<Vec<PaperMetadata>, ProviderError> {
        use roxmltree::Document;

        let doc = Document::parse(response_text)
            .map_err(|e| ProviderError::Parse(format!("Failed to parse XML: {e}")))?;

        let papers: Vec<PaperMetadata> = doc
            .descendants()
            .filter(|n| n.has_tag_name("entry"))
            .filter_map(|entry| self.parse_entry(entry))
            .collect();

        debug!("Parsed {} papers from arXiv response", papers.len());
        Ok(papers)
    }

    /// Parse one `<entry>`; entries without a usable id or title are skipped
    fn parse_entry(&self, entry: roxmltree::Node<'_, '_>) -> Option<PaperMetadata> {
        let mut abs_url = None;
        let mut title = None;
        let mut abstract_text = String::new();
        let mut published = String::new();
        let mut authors = Vec::new();
        let mut pdf_url = None;
        let mut categories = Vec::new();

        for child in entry.children().filter(roxmltree::Node::is_element) {
            match child.tag_name().name() {
                "id" => abs_url = child.text().map(|t| t.trim().to_string()),
                "title" => title = child.text().map(collapse),
                "summary" => abstract_text = child.text().map(collapse).unwrap_or_default(),
                "published" => published = child.text().unwrap_or_default().trim().to_string(),
                "author" => authors.extend(
                    child
                        .descendants()
                        .filter(|n| n.has_tag_name("name"))
                        .filter_map(|n| n.text())
                        .map(|name| name.trim().to_string()),
                ),
                "link" => {
                    let is_pdf = child.attribute("title") == Some("pdf")
                        || child.attribute("type") == Some("application/pdf");
                    if is_pdf && pdf_url.is_none() {
                        pdf_url = child.attribute("href").map(str::to_string);
                    }
                }
                "category" => {
                    if let Some(term) = child.attribute("term") {
                        if !categories.iter().any(|c| c == term) {
                            categories.push(term.to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        let abs_url = abs_url?;
        let id = match ArxivId::new(&abs_url) {
            Ok(id) => id,
            Err(e) => {
                debug!("Skipping arXiv entry with unusable id {}: {}", abs_url, e);
                return None;
            }
        };

        Some(PaperMetadata {
            title: title.filter(|t| !t.is_empty())?,
            authors,
            abstract_text,
            published,
            pdf_url: pdf_url.unwrap_or_else(|| id.url_under(&self.pdf_base)),
            abs_url,
            categories,
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl SourceProvider for ArxivProvider {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(
        &self,
        query: &SearchQuery,
        context: &SearchContext,
    ) -> Result<ProviderResult, ProviderError> {
        let start_time = Instant::now();

        if query.query.trim().is_empty() {
            return Err(ProviderError::InvalidQuery("query cannot be empty".to_string()));
        }

        info!("Searching arXiv for: {} (sort: {})", query.query, query.sort_by);

        let url = self.build_search_url(query)?;
        let papers = self.fetch_feed(&url, context).await?;
        let search_time = start_time.elapsed();
        let has_more = u32::try_from(papers.len()).unwrap_or(u32::MAX) >= query.max_results;

        info!(
            "arXiv search completed: {} papers found in {:?}",
            papers.len(),
            search_time
        );

        Ok(ProviderResult {
            papers,
            source: "arXiv".to_string(),
            search_time,
            has_more,
        })
    }

    async fn health_check(&self, context: &SearchContext) -> Result<bool, ProviderError> {
        debug!("Performing arXiv health check");

        let query = SearchQuery {
            query: "quantum".to_string(),
            max_results: 1,
            offset: 0,
            sort_by: super::SortBy::Relevance,
        };

        match self.search(&query, context).await {
            Ok(result) => {
                let healthy = !result.papers.is_empty();
                info!("arXiv health check: {}", if healthy { "OK" } else { "No results" });
                Ok(healthy)
            }
            Err(ProviderError::RateLimit) => {
                info!("arXiv health check: OK (rate limited but responsive)");
                Ok(true)
            }
            Err(e) => {
                warn!("arXiv health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
