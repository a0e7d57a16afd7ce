use crate::client::PaperMetadata;
use crate::config::SummaryConfig;
use crate::summary::{DetailLevel, Summarizer};
use crate::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Input parameters for a single summary
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummarizeInput {
    /// Paper abstract (50-10000 characters)
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Detail level: 1 = overview, 2 = technical digest, 3 = comprehensive review
    pub level: u8,
    /// arXiv identifier; required for levels 2 and 3, which read the full paper
    #[serde(default)]
    pub paper_id: Option<String>,
}

/// Input parameters for all three levels at once
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummarizeAllInput {
    /// Paper abstract (50-10000 characters)
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// arXiv identifier; without it levels 2 and 3 report as unavailable
    #[serde(default)]
    pub paper_id: Option<String>,
}

/// Input parameters for a batch of papers
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummarizeInput {
    /// Paper records, typically taken from a search result (1-20)
    pub papers: Vec<PaperMetadata>,
    /// Detail level applied to every paper
    pub level: u8,
}

/// A single generated summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResult {
    pub level: u8,
    pub paper_id: Option<String>,
    /// Markdown summary
    pub summary: String,
}

/// Summaries keyed by level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AllLevelsResult {
    pub paper_id: Option<String>,
    pub summaries: BTreeMap<u8, String>,
}

/// Summaries keyed by paper id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummaryResult {
    pub level: u8,
    pub summaries: BTreeMap<String, String>,
}

/// Request validation in front of the [`Summarizer`]
#[derive(Debug, Clone)]
pub struct SummarizeTool {
    summarizer: Arc<Summarizer>,
    limits: SummaryConfig,
}

impl SummarizeTool {
    /// Create a new summarize tool
    pub fn new(summarizer: Arc<Summarizer>, limits: SummaryConfig) -> Self {
        info!("Initializing summarize tool");
        Self { summarizer, limits }
    }

    /// Summarize one paper at one level
    #[instrument(skip(self, input), fields(level = input.level, paper_id = ?input.paper_id))]
    pub async fn summarize(&self, input: SummarizeInput) -> Result<SummaryResult> {
        let level = DetailLevel::try_from(input.level)?;
        if level.uses_full_text()
            && input
                .paper_id
                .as_deref()
                .map_or(true, |id| id.trim().is_empty())
        {
            return Err(Error::MissingIdentifier { level: input.level });
        }
        self.validate_abstract(&input.abstract_text)?;

        let summary = self
            .summarizer
            .generate_summary(&input.abstract_text, input.level, input.paper_id.as_deref())
            .await?;

        Ok(SummaryResult {
            level: input.level,
            paper_id: input.paper_id,
            summary,
        })
    }

    /// Summarize one paper at every level
    #[instrument(skip(self, input), fields(paper_id = ?input.paper_id))]
    pub async fn summarize_all_levels(&self, input: SummarizeAllInput) -> Result<AllLevelsResult> {
        self.validate_abstract(&input.abstract_text)?;

        let summaries = self
            .summarizer
            .generate_all_levels(&input.abstract_text, input.paper_id.as_deref())
            .await;

        Ok(AllLevelsResult {
            paper_id: input.paper_id,
            summaries,
        })
    }

    /// Summarize a batch of papers at one level
    #[instrument(skip(self, input), fields(level = input.level, papers = input.papers.len()))]
    pub async fn batch_summarize(&self, input: BatchSummarizeInput) -> Result<BatchSummaryResult> {
        DetailLevel::try_from(input.level)?;

        let count = input.papers.len();
        if count == 0 || count > self.limits.max_batch_size {
            return Err(Error::InvalidInput {
                field: "papers".to_string(),
                reason: format!(
                    "batch must contain between 1 and {} papers, got {count}",
                    self.limits.max_batch_size
                ),
            });
        }

        let summaries = self
            .summarizer
            .batch_summarize(&input.papers, input.level)
            .await?;

        Ok(BatchSummaryResult {
            level: input.level,
            summaries,
        })
    }

    fn validate_abstract(&self, abstract_text: &str) -> Result<()> {
        let chars = abstract_text.trim().chars().count();

        if chars < self.limits.min_abstract_chars {
            return Err(Error::InvalidInput {
                field: "abstract".to_string(),
                reason: format!(
                    "abstract is too short ({chars} chars, minimum {})",
                    self.limits.min_abstract_chars
                ),
            });
        }

        if chars > self.limits.max_abstract_chars {
            return Err(Error::InvalidInput {
                field: "abstract".to_string(),
                reason: format!(
                    "abstract is too long ({chars} chars, maximum {})",
                    self.limits.max_abstract_chars
                ),
            });
        }

        Ok(())
    }
}
