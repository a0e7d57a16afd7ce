//! # Leveled Summaries
//!
//! The [`Summarizer`] turns an abstract, and for deeper levels the paper's
//! full text, into a markdown summary through one structured-output model
//! call. Results are cached for the life of the process under a fingerprint
//! of what was summarized:
//!
//! | Level | Source | Fingerprint selector |
//! |---|---|---|
//! | 1 Overview | abstract | abstract text |
//! | 2 Technical digest | full text | paper identifier |
//! | 3 Comprehensive review | full text | paper identifier |

pub mod prompt;

pub use prompt::{build_prompt, SYSTEM_PROMPT};

use crate::client::{ArxivId, PaperMetadata};
use crate::config::{LlmConfig, SummaryConfig};
use crate::ports::{FullTextPort, GenerativeModelPort, StructuredRequest};
use crate::repositories::{CacheRepository, InMemoryCacheRepository};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Name the output schema is registered under with the model endpoint
pub const SUMMARY_SCHEMA_NAME: &str = "paper_summary";

/// How deep a summary goes, and what it is written from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DetailLevel {
    /// Casual bullet points from the abstract
    Overview = 1,
    /// Contributions and methodology from the full text
    TechnicalDigest = 2,
    /// Findings, details, impact and limitations from the full text
    ComprehensiveReview = 3,
}

impl DetailLevel {
    pub const ALL: [Self; 3] = [
        Self::Overview,
        Self::TechnicalDigest,
        Self::ComprehensiveReview,
    ];

    /// Whether this level is written from the full paper rather than the abstract
    #[must_use]
    pub const fn uses_full_text(self) -> bool {
        match self {
            Self::Overview => false,
            Self::TechnicalDigest | Self::ComprehensiveReview => true,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DetailLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(Self::Overview),
            2 => Ok(Self::TechnicalDigest),
            3 => Ok(Self::ComprehensiveReview),
            _ => Err(Error::InvalidLevel { level }),
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Text stored for a level or paper whose summary could not be produced
#[must_use]
pub fn placeholder(level: u8) -> String {
    format!("Summary unavailable for level {level}")
}

/// Cache key: hex SHA-256 of `"{selector}:{level}"`
#[must_use]
pub fn fingerprint(selector: &str, level: DetailLevel) -> String {
    format!("{:x}", Sha256::digest(format!("{selector}:{level}").as_bytes()))
}

/// JSON schema the model's answer must satisfy
#[must_use]
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary_markdown": { "type": "string" }
        },
        "required": ["summary_markdown"],
        "additionalProperties": false
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummaryOutput {
    summary_markdown: String,
}

/// Validate raw model content against the output schema
pub fn parse_summary_output(content: &str) -> Result<String> {
    let output: SummaryOutput =
        serde_json::from_str(content.trim()).map_err(|e| Error::ModelContract {
            message: format!("expected {{\"summary_markdown\": string}}: {e}"),
        })?;

    let summary = output.summary_markdown.trim();
    if summary.is_empty() {
        return Err(Error::ModelContract {
            message: "summary_markdown is empty".to_string(),
        });
    }
    Ok(summary.to_string())
}

/// Model parameters applied to every request
#[derive(Debug, Clone)]
struct ModelSettings {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

/// Leveled summary generator with its own summary cache
pub struct Summarizer {
    retriever: Arc<dyn FullTextPort>,
    model: Arc<dyn GenerativeModelPort>,
    cache: InMemoryCacheRepository<String>,
    settings: ModelSettings,
    batch_concurrency: usize,
}

impl fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summarizer")
            .field("settings", &self.settings)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    /// Create a summarizer with an empty summary cache
    pub fn new(
        retriever: Arc<dyn FullTextPort>,
        model: Arc<dyn GenerativeModelPort>,
        llm: &LlmConfig,
        summary: &SummaryConfig,
    ) -> Self {
        Self {
            retriever,
            model,
            cache: InMemoryCacheRepository::new("summary"),
            settings: ModelSettings {
                model: llm.model.clone(),
                temperature: llm.temperature,
                max_tokens: llm.max_output_tokens,
            },
            batch_concurrency: summary.batch_concurrency.max(1),
        }
    }

    /// Handle onto the summary cache
    #[must_use]
    pub const fn cache(&self) -> &InMemoryCacheRepository<String> {
        &self.cache
    }

    /// Summarize a paper at `level`
    ///
    /// Level 1 summarizes `abstract_text` directly. Levels 2 and 3 need
    /// `paper_id` to fetch the full text, and fall back to the abstract when
    /// no text can be retrieved. A cached summary is returned without any
    /// network traffic.
    #[instrument(skip(self, abstract_text))]
    pub async fn generate_summary(
        &self,
        abstract_text: &str,
        level: u8,
        paper_id: Option<&str>,
    ) -> Result<String> {
        let level = DetailLevel::try_from(level)?;

        let id = if level.uses_full_text() {
            let raw = paper_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or(Error::MissingIdentifier {
                    level: level.as_u8(),
                })?;
            Some(ArxivId::new(raw)?)
        } else {
            None
        };

        let key = match &id {
            Some(id) => fingerprint(id.as_str(), level),
            None => fingerprint(abstract_text, level),
        };

        if let Some(summary) = self.cache.get(&key).await {
            debug!("Summary cache hit for level {}", level);
            return Ok(summary);
        }

        let source = match &id {
            Some(id) => match self.retriever.fetch_full_text(id).await {
                Some(text) => text,
                None => {
                    warn!(
                        "Full text not available for {}, summarizing the abstract instead",
                        id
                    );
                    abstract_text.to_string()
                }
            },
            None => abstract_text.to_string(),
        };

        info!(
            "Generating level {} summary from {} chars of source text",
            level,
            source.chars().count()
        );

        let request = StructuredRequest {
            model: self.settings.model.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_prompt(level, &source),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            schema_name: SUMMARY_SCHEMA_NAME.to_string(),
            schema: summary_schema(),
        };

        let content = self.model.complete_structured(&request).await.map_err(|e| {
            error!("Level {} summary failed: {}", level, e);
            e
        })?;
        let summary = parse_summary_output(&content).map_err(|e| {
            error!("Level {} summary rejected: {}", level, e);
            e
        })?;

        self.cache.insert(&key, summary.clone()).await;
        info!("Generated level {} summary ({} chars)", level, summary.len());
        Ok(summary)
    }

    /// Summaries at every level, in order
    ///
    /// A level that fails is reported with [`placeholder`] text; the other
    /// levels are still attempted.
    pub async fn generate_all_levels(
        &self,
        abstract_text: &str,
        paper_id: Option<&str>,
    ) -> BTreeMap<u8, String> {
        let mut summaries = BTreeMap::new();

        for level in DetailLevel::ALL {
            let level = level.as_u8();
            let summary = match self.generate_summary(abstract_text, level, paper_id).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("Failed to generate level {} summary: {}", level, e);
                    placeholder(level)
                }
            };
            summaries.insert(level, summary);
        }

        summaries
    }

    /// Summarize many papers at one level, keyed by paper id
    ///
    /// The level is validated up front. After that, per-paper failures turn
    /// into [`placeholder`] entries, so the map has exactly one entry per
    /// distinct id.
    #[instrument(skip(self, papers), fields(papers = papers.len()))]
    pub async fn batch_summarize(
        &self,
        papers: &[PaperMetadata],
        level: u8,
    ) -> Result<BTreeMap<String, String>> {
        let detail = DetailLevel::try_from(level)?;

        let mut seen = HashSet::new();
        let unique: Vec<&PaperMetadata> = papers
            .iter()
            .filter(|paper| seen.insert(paper.id.as_str()))
            .collect();

        info!(
            "Batch summarizing {} papers at level {} (concurrency {})",
            unique.len(),
            detail,
            self.batch_concurrency
        );

        // Owned items sidestep a rustc higher-ranked `Send` inference bug
        // (rust-lang/rust#64552) with reference-taking closures here.
        let results: Vec<(String, String)> = stream::iter(unique.into_iter().cloned())
            .map(|paper| async move {
                let summary = match self
                    .generate_summary(&paper.abstract_text, level, Some(&paper.id))
                    .await
                {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!("Batch summary failed for {}: {}", paper.id, e);
                        placeholder(level)
                    }
                };
                (paper.id.clone(), summary)
            })
            .buffer_unordered(self.batch_concurrency)
            .collect()
            .await;

        Ok(results.into_iter().collect())
    }
}
