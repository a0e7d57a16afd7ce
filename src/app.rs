//! Wiring of clients, caches and tools for one process

use crate::client::{build_http_client, ArxivProvider, ChatCompletionClient};
use crate::ports::GenerativeModelPort;
use crate::retrieval::FullTextRetriever;
use crate::summary::Summarizer;
use crate::tools::{BibliographyTool, SearchTool, SummarizeTool};
use crate::{Config, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Every long-lived component, built once and shared
///
/// The three caches (content, summary, search) live inside the retriever,
/// the summarizer and the search tool, so each context starts empty.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub provider: Arc<ArxivProvider>,
    pub retriever: Arc<FullTextRetriever>,
    pub summarizer: Arc<Summarizer>,
    pub search_tool: SearchTool,
    pub summarize_tool: SummarizeTool,
    pub bibliography_tool: BibliographyTool,
}

impl AppContext {
    /// Build the context with the configured chat completion endpoint
    pub fn new(config: Config) -> Result<Self> {
        let model = ChatCompletionClient::new(config.llm.clone())?;
        if !model.has_api_key() {
            warn!("No language model API key configured; summaries will fail until one is set");
        }
        Self::with_model(config, Arc::new(model))
    }

    /// Build the context around an arbitrary model implementation
    pub fn with_model(config: Config, model: Arc<dyn GenerativeModelPort>) -> Result<Self> {
        let http = build_http_client(&config.arxiv)?;

        let provider = Arc::new(ArxivProvider::with_client(http.clone(), &config.arxiv));
        let retriever = Arc::new(FullTextRetriever::new(
            http,
            &config.arxiv,
            config.retriever.clone(),
        ));
        let summarizer = Arc::new(Summarizer::new(
            retriever.clone(),
            model,
            &config.llm,
            &config.summary,
        ));

        let search_tool = SearchTool::new(provider.clone(), config.arxiv.search_timeout());
        let summarize_tool = SummarizeTool::new(summarizer.clone(), config.summary.clone());

        info!(
            "Application context ready (model: {}, endpoint: {})",
            config.llm.model, config.llm.base_url
        );

        Ok(Self {
            config: Arc::new(config),
            provider,
            retriever,
            summarizer,
            search_tool,
            summarize_tool,
            bibliography_tool: BibliographyTool::new(),
        })
    }
}
