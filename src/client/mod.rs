pub mod chat;
pub mod providers;

pub use chat::ChatCompletionClient;
pub use providers::{ArxivProvider, SourceProvider};

use crate::config::ArxivConfig;
use crate::Result;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;

/// Build the shared HTTP client used for arXiv traffic
///
/// Per-request timeouts are applied by each caller; this one only bounds connection setup.
pub fn build_http_client(config: &ArxivConfig) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(config.user_agent.clone())
        .build()?)
}

fn arxiv_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // New style YYMM.NNNNN, old style archive(.SUBJ)/YYMMNNN, optional version suffix
        Regex::new(r"^(?:\d{4}\.\d{4,5}|[a-z][a-z\-]*(?:\.[A-Z]{2})?/\d{7})(?:v\d+)?$")
            .expect("static arXiv id pattern compiles")
    })
}

fn version_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"v\d+$").expect("static version pattern compiles")
    })
}

/// arXiv accession number without a version suffix
///
/// `2301.12345v2`, `arXiv:2301.12345` and `https://arxiv.org/abs/2301.12345v1`
/// all normalize to `2301.12345`, so they share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArxivId(String);

impl ArxivId {
    /// Parse and normalize an identifier, validating the format
    pub fn new(raw: &str) -> Result<Self> {
        let mut cleaned = raw.trim();

        for prefix in ["https://", "http://"] {
            cleaned = cleaned.strip_prefix(prefix).unwrap_or(cleaned);
        }
        for prefix in ["export.arxiv.org/", "www.arxiv.org/", "arxiv.org/"] {
            cleaned = cleaned.strip_prefix(prefix).unwrap_or(cleaned);
        }
        for prefix in ["abs/", "pdf/", "html/"] {
            cleaned = cleaned.strip_prefix(prefix).unwrap_or(cleaned);
        }
        cleaned = cleaned
            .strip_prefix("arXiv:")
            .or_else(|| cleaned.strip_prefix("arxiv:"))
            .unwrap_or(cleaned);
        cleaned = cleaned.strip_suffix(".pdf").unwrap_or(cleaned);
        cleaned = cleaned.trim_end_matches('/');

        if cleaned.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "paper_id".to_string(),
                reason: "arXiv identifier cannot be empty".to_string(),
            });
        }

        if !arxiv_id_pattern().is_match(cleaned) {
            return Err(crate::Error::InvalidInput {
                field: "paper_id".to_string(),
                reason: format!("'{raw}' is not a valid arXiv identifier"),
            });
        }

        Ok(Self(version_suffix().replace(cleaned, "").into_owned()))
    }

    /// Get the identifier string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{base}/{id}` for any of the configured arXiv bases
    #[must_use]
    pub fn url_under(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for ArxivId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ArxivId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ArxivId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Paper metadata record produced by search and consumed by batch summaries and citations
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct PaperMetadata {
    /// arXiv identifier without version suffix
    pub id: String,
    /// Paper title
    pub title: String,
    /// Authors, in byline order
    pub authors: Vec<String>,
    /// Abstract, whitespace-collapsed
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication timestamp (RFC 3339)
    pub published: String,
    /// Download URL for the PDF
    pub pdf_url: String,
    /// Abstract landing page
    pub abs_url: String,
    /// arXiv category tags, primary first
    #[serde(default)]
    pub categories: Vec<String>,
}

impl PaperMetadata {
    /// Create a record with only an identifier and abstract, deriving arXiv links
    #[must_use]
    pub fn new(id: &ArxivId, abstract_text: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            title: String::new(),
            authors: Vec::new(),
            abstract_text: abstract_text.into(),
            published: String::new(),
            pdf_url: id.url_under("https://arxiv.org/pdf"),
            abs_url: id.url_under("https://arxiv.org/abs"),
            categories: Vec::new(),
        }
    }
}
