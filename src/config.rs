//! # Configuration
//!
//! Layered configuration: built-in defaults, an optional TOML file, then
//! `ARXIV_DIGEST__SECTION__KEY` environment variables, then provider API keys
//! from the environment, then command-line overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const ENV_PREFIX: &str = "ARXIV_DIGEST";

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub arxiv: ArxivConfig,
    pub retriever: RetrieverConfig,
    pub llm: LlmConfig,
    pub summary: SummaryConfig,
}

/// MCP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported to MCP clients
    pub name: String,
    /// Seconds allowed for in-flight work after a shutdown signal
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "arxiv-digest".to_string(),
            graceful_shutdown_timeout_secs: 5,
        }
    }
}

/// arXiv endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    /// Atom query API
    pub api_base: String,
    /// Abstract landing pages (`{abs_base}/{id}`)
    pub abs_base: String,
    /// PDF documents (`{pdf_base}/{id}`)
    pub pdf_base: String,
    /// HTML renderings (`{html_base}/{id}`)
    pub html_base: String,
    pub user_agent: String,
    pub search_timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_base: "http://export.arxiv.org/api/query".to_string(),
            abs_base: "https://arxiv.org/abs".to_string(),
            pdf_base: "https://arxiv.org/pdf".to_string(),
            html_base: "https://arxiv.org/html".to_string(),
            user_agent: concat!("arxiv-digest/", env!("CARGO_PKG_VERSION"), " (Academic Research Tool)")
                .to_string(),
            search_timeout_secs: 30,
        }
    }
}

impl ArxivConfig {
    #[must_use]
    pub const fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

/// Full-text retrieval chain settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Try the structured HTML rendering before the PDF
    pub use_html_rendering: bool,
    /// Timeout for PDF and HTML rendering downloads
    pub document_timeout_secs: u64,
    /// Timeout for the abstract landing page
    pub page_timeout_secs: u64,
    /// Upper bound on a single PDF text extraction
    pub extraction_timeout_secs: u64,
    /// Number of PDF extractions allowed on the blocking pool at once
    pub max_parallel_extractions: usize,
    /// Hard cap on cached document text, in characters
    pub max_content_chars: usize,
    /// HTML renderings shorter than this are treated as stubs
    pub min_html_chars: usize,
    /// PDFs larger than this are not parsed
    pub max_pdf_bytes: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            use_html_rendering: true,
            document_timeout_secs: 60,
            page_timeout_secs: 30,
            extraction_timeout_secs: 60,
            max_parallel_extractions: 2,
            max_content_chars: 100_000,
            min_html_chars: 1_000,
            max_pdf_bytes: 50 * 1024 * 1024,
        }
    }
}

impl RetrieverConfig {
    #[must_use]
    pub const fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    #[must_use]
    pub const fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    #[must_use]
    pub const fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Request bounds applied by the tool layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub min_abstract_chars: usize,
    pub max_abstract_chars: usize,
    pub max_batch_size: usize,
    pub batch_concurrency: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_abstract_chars: 50,
            max_abstract_chars: 10_000,
            max_batch_size: 20,
            batch_concurrency: 4,
        }
    }
}

/// Values supplied on the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub max_content_chars: Option<usize>,
    pub use_html_rendering: Option<bool>,
}

/// Provider keys read straight from the process environment
#[derive(Debug, Default, Deserialize)]
struct ApiKeyEnv {
    google_api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(Path::to_path_buf).or_else(Self::default_config_path);

        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(ref file) = file {
            debug!("Looking for configuration file at {}", file.display());
            // An explicitly requested file must exist
            builder = builder.add_source(::config::File::from(file.as_path()).required(path.is_some()));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if config.llm.api_key.is_none() {
            let keys: ApiKeyEnv = envy::from_env()?;
            config.llm.api_key = keys.google_api_key.or(keys.openai_api_key);
        }

        info!(
            "Configuration loaded (model: {}, html rendering: {}, content cap: {} chars)",
            config.llm.model, config.retriever.use_html_rendering, config.retriever.max_content_chars
        );
        Ok(config)
    }

    /// Parse a configuration from TOML text, without consulting the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// `$XDG_CONFIG_HOME/arxiv-digest/config.toml` (or the platform equivalent)
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("arxiv-digest").join("config.toml"))
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref model) = overrides.llm_model {
            self.llm.model.clone_from(model);
        }
        if let Some(ref base_url) = overrides.llm_base_url {
            self.llm.base_url.clone_from(base_url);
        }
        if let Some(max_chars) = overrides.max_content_chars {
            self.retriever.max_content_chars = max_chars;
        }
        if let Some(use_html) = overrides.use_html_rendering {
            self.retriever.use_html_rendering = use_html;
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("arxiv.api_base", &self.arxiv.api_base),
            ("arxiv.abs_base", &self.arxiv.abs_base),
            ("arxiv.pdf_base", &self.arxiv.pdf_base),
            ("arxiv.html_base", &self.arxiv.html_base),
            ("llm.base_url", &self.llm.base_url),
        ] {
            url::Url::parse(value).map_err(|e| invalid(field, format!("not a valid URL: {e}")))?;
        }

        for (field, secs) in [
            ("arxiv.search_timeout_secs", self.arxiv.search_timeout_secs),
            ("retriever.document_timeout_secs", self.retriever.document_timeout_secs),
            ("retriever.page_timeout_secs", self.retriever.page_timeout_secs),
            ("retriever.extraction_timeout_secs", self.retriever.extraction_timeout_secs),
            ("llm.timeout_secs", self.llm.timeout_secs),
        ] {
            if secs == 0 {
                return Err(invalid(field, "timeout must be greater than zero"));
            }
        }

        for (field, value) in [
            ("retriever.max_parallel_extractions", self.retriever.max_parallel_extractions),
            ("retriever.max_content_chars", self.retriever.max_content_chars),
            ("retriever.max_pdf_bytes", self.retriever.max_pdf_bytes),
            ("summary.max_batch_size", self.summary.max_batch_size),
            ("summary.batch_concurrency", self.summary.batch_concurrency),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        if self.summary.min_abstract_chars >= self.summary.max_abstract_chars {
            return Err(invalid(
                "summary.min_abstract_chars",
                "must be smaller than summary.max_abstract_chars",
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "model name cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: reason.into(),
    }
}
