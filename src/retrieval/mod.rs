//! # Full-Text Retrieval
//!
//! Turns an arXiv identifier into the best plain text available for it,
//! trying each source in order until one yields something usable:
//!
//! 1. the content cache
//! 2. the structured HTML rendering (when enabled)
//! 3. the PDF, parsed with `lopdf` on the blocking pool
//! 4. the abstract scraped from the landing page (degraded)
//!
//! A source that fails is logged at `warn` and skipped. Only when every
//! source fails does the caller get `None`; retrieval never surfaces an error.

pub mod html;
pub mod pdf;
pub mod text;

pub use pdf::PdfExtractor;
pub use text::{normalize_whitespace, truncate_with_marker, TRUNCATION_MARKER};

use crate::client::ArxivId;
use crate::config::{ArxivConfig, RetrieverConfig};
use crate::ports::FullTextPort;
use crate::repositories::{CacheRepository, InMemoryCacheRepository};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Where a piece of retrieved text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalSource {
    Cache,
    HtmlRendering,
    Pdf,
    AbstractPage,
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::HtmlRendering => "html rendering",
            Self::Pdf => "pdf",
            Self::AbstractPage => "abstract page",
        })
    }
}

/// Text produced by one retrieval, with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedText {
    pub source: RetrievalSource,
    pub text: String,
}

/// Document retriever owning the content cache
#[derive(Debug, Clone)]
pub struct FullTextRetriever {
    client: Client,
    abs_base: String,
    pdf_base: String,
    html_base: String,
    config: RetrieverConfig,
    cache: InMemoryCacheRepository<String>,
    pdf: PdfExtractor,
}

impl FullTextRetriever {
    /// Create a retriever with an empty content cache
    #[must_use]
    pub fn new(client: Client, arxiv: &ArxivConfig, config: RetrieverConfig) -> Self {
        Self::with_cache(client, arxiv, config, InMemoryCacheRepository::new("content"))
    }

    /// Create a retriever around an existing content cache
    #[must_use]
    pub fn with_cache(
        client: Client,
        arxiv: &ArxivConfig,
        config: RetrieverConfig,
        cache: InMemoryCacheRepository<String>,
    ) -> Self {
        let pdf = PdfExtractor::new(config.max_parallel_extractions, config.extraction_timeout());
        Self {
            client,
            abs_base: arxiv.abs_base.clone(),
            pdf_base: arxiv.pdf_base.clone(),
            html_base: arxiv.html_base.clone(),
            config,
            cache,
            pdf,
        }
    }

    /// Handle onto the content cache
    #[must_use]
    pub const fn cache(&self) -> &InMemoryCacheRepository<String> {
        &self.cache
    }

    /// Best-available text with the source it came from
    #[instrument(skip(self), fields(paper_id = %id))]
    pub async fn retrieve(&self, id: &ArxivId) -> Option<RetrievedText> {
        if let Some(text) = self.cache.get(id.as_str()).await {
            debug!("Content cache hit for {}", id);
            return Some(RetrievedText {
                source: RetrievalSource::Cache,
                text,
            });
        }

        info!("Retrieving full text for {}", id);

        let mut chain = Vec::with_capacity(3);
        if self.config.use_html_rendering {
            chain.push(RetrievalSource::HtmlRendering);
        }
        chain.push(RetrievalSource::Pdf);
        chain.push(RetrievalSource::AbstractPage);

        for source in chain {
            let attempt = match source {
                RetrievalSource::HtmlRendering => self.from_html_rendering(id).await,
                RetrievalSource::Pdf => self.from_pdf(id).await,
                RetrievalSource::AbstractPage => self.from_abstract_page(id).await,
                RetrievalSource::Cache => continue,
            };

            match attempt {
                Ok(text) => {
                    if source == RetrievalSource::AbstractPage {
                        warn!("Using abstract only for {}: full text unavailable", id);
                    }
                    info!(
                        "Retrieved {} chars for {} from {}",
                        text.chars().count(),
                        id,
                        source
                    );
                    self.cache.insert(id.as_str(), text.clone()).await;
                    return Some(RetrievedText { source, text });
                }
                Err(e) => warn!("Retrieval step '{}' failed for {}: {}", source, id, e),
            }
        }

        warn!("No text could be retrieved for {}", id);
        None
    }

    /// Abstract scraped from the landing page, bypassing the content cache
    #[instrument(skip(self), fields(paper_id = %id))]
    pub async fn landing_abstract(&self, id: &ArxivId) -> Result<String> {
        let url = id.url_under(&self.abs_base);
        let page = self.fetch_html_page(&url, self.config.page_timeout()).await?;
        html::extract_abstract(&page).ok_or_else(|| rejected(&url, "no abstract block on the landing page"))
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout { timeout }
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejected(url, format!("HTTP {status}")));
        }
        Ok(response)
    }

    async fn fetch_html_page(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self.get(url, timeout).await?;
        let content_type = content_type(&response);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
        {
            return Err(rejected(
                url,
                format!("expected HTML, got {}", content_type.as_deref().unwrap_or("no content type")),
            ));
        }
        Ok(response.text().await?)
    }

    async fn from_html_rendering(&self, id: &ArxivId) -> Result<String> {
        let url = id.url_under(&self.html_base);
        let page = self.fetch_html_page(&url, self.config.document_timeout()).await?;

        let text = html::extract_article_text(&page);
        let chars = text.chars().count();
        if chars < self.config.min_html_chars {
            return Err(rejected(
                &url,
                format!("rendering has {chars} chars, below the {} char minimum", self.config.min_html_chars),
            ));
        }

        Ok(truncate_with_marker(text, self.config.max_content_chars))
    }

    async fn from_pdf(&self, id: &ArxivId) -> Result<String> {
        let url = id.url_under(&self.pdf_base);
        let mut response = self.get(&url, self.config.document_timeout()).await?;
        let content_type = content_type(&response);
        let max_bytes = self.config.max_pdf_bytes;

        if let Some(length) = response.content_length() {
            if usize::try_from(length).map_or(true, |length| length > max_bytes) {
                return Err(rejected(&url, format!("PDF is {length} bytes, limit is {max_bytes}")));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(rejected(&url, format!("PDF exceeds {max_bytes} bytes")));
            }
            bytes.extend_from_slice(&chunk);
        }

        if !pdf::looks_like_pdf(content_type.as_deref(), &bytes) {
            return Err(rejected(
                &url,
                format!(
                    "response is not a PDF (content type {})",
                    content_type.as_deref().unwrap_or("missing")
                ),
            ));
        }

        debug!("Downloaded {} PDF bytes for {}", bytes.len(), id);
        let raw = self.pdf.extract(bytes).await?;
        let text = text::finalize(&raw, self.config.max_content_chars);
        if text.is_empty() {
            return Err(rejected(&url, "PDF contains no extractable text"));
        }
        Ok(text)
    }

    async fn from_abstract_page(&self, id: &ArxivId) -> Result<String> {
        let text = self.landing_abstract(id).await?;
        Ok(truncate_with_marker(text, self.config.max_content_chars))
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn rejected(url: &str, reason: impl Into<String>) -> Error {
    Error::ServiceUnavailable {
        service: url.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl FullTextPort for FullTextRetriever {
    async fn fetch_full_text(&self, id: &ArxivId) -> Option<String> {
        self.retrieve(id).await.map(|retrieved| retrieved.text)
    }
}
