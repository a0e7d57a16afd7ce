use crate::client::PaperMetadata;
use crate::Result;
use chrono::{DateTime, Datelike, Local, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// arXiv category used when a record carries none
const DEFAULT_PRIMARY_CLASS: &str = "cs.AI";

/// Input parameters for the bibliography tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BibliographyInput {
    /// Paper records, typically taken from a search result
    pub papers: Vec<PaperMetadata>,
}

/// Result of bibliography generation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BibliographyResult {
    /// One entry per input paper, in input order
    pub citations: Vec<Citation>,
    /// Complete `.bib` file content
    pub bibliography: String,
}

/// Individual citation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    /// arXiv identifier of the paper
    pub id: String,
    /// BibTeX citation key
    pub key: String,
    /// `@article` entry
    pub bibtex: String,
}

/// Citation key: first author's surname, year, first three title words
///
/// `Vaswani2017AttentionIsAll` for "Attention Is All You Need" (2017).
#[must_use]
pub fn citation_key(authors: &[String], title: &str, year: i32) -> String {
    let surname: String = authors
        .first()
        .and_then(|author| author.split_whitespace().last())
        .map(|last| last.chars().filter(char::is_ascii_alphabetic).collect())
        .filter(|surname: &String| !surname.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let title_part: String = cleaned.split_whitespace().take(3).map(capitalize).collect();

    format!("{surname}{year}{title_part}")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Year and lowercase month name of an RFC 3339 publication date
fn publication_date(published: &str) -> (i32, Option<String>) {
    DateTime::parse_from_rfc3339(published.trim()).map_or_else(
        |_| (Utc::now().year(), None),
        |date| (date.year(), Some(date.format("%B").to_string().to_lowercase())),
    )
}

/// Format one paper as a BibTeX `@article` entry
#[must_use]
pub fn paper_to_bibtex(paper: &PaperMetadata) -> String {
    let (year, month) = publication_date(&paper.published);
    let key = citation_key(&paper.authors, &paper.title, year);
    let title = paper.title.replace('{', "\\{").replace('}', "\\}");
    let primary_class = paper
        .categories
        .first()
        .map_or(DEFAULT_PRIMARY_CLASS, String::as_str);

    let mut parts = vec![
        format!("@article{{{key},"),
        format!("  title = {{{title}}},"),
        format!("  author = {{{}}},", paper.authors.join(" and ")),
        format!("  year = {{{year}}},"),
    ];

    if let Some(month) = month {
        parts.push(format!("  month = {{{month}}},"));
    }

    parts.push(format!("  journal = {{arXiv preprint arXiv:{}}},", paper.id));
    parts.push(format!("  eprint = {{{}}},", paper.id));
    parts.push("  archivePrefix = {arXiv},".to_string());
    parts.push(format!("  primaryClass = {{{primary_class}}},"));
    parts.push(format!("  url = {{{}}},", paper.abs_url));
    parts.push(format!("  note = {{Available at: {}}}", paper.pdf_url));
    parts.push("}".to_string());

    parts.join("\n")
}

/// Complete `.bib` file with a comment header, stamped with the current time
#[must_use]
pub fn papers_to_bibtex_file(papers: &[PaperMetadata]) -> String {
    papers_to_bibtex_file_at(papers, Local::now())
}

/// Complete `.bib` file with a comment header stamped `generated_at`
#[must_use]
pub fn papers_to_bibtex_file_at(papers: &[PaperMetadata], generated_at: DateTime<Local>) -> String {
    let header = format!(
        "% BibTeX export from arxiv-digest\n% Generated on {}\n% Total papers: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        papers.len()
    );

    let entries: Vec<String> = papers.iter().map(paper_to_bibtex).collect();
    header + &entries.join("\n\n")
}

/// Bibliography generation tool
#[derive(Debug, Clone, Default)]
pub struct BibliographyTool;

impl BibliographyTool {
    /// Create a new bibliography tool
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate BibTeX for a set of paper records
    #[instrument(skip(self, input), fields(papers = input.papers.len()))]
    pub fn export(&self, input: &BibliographyInput) -> Result<BibliographyResult> {
        if input.papers.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "papers".to_string(),
                reason: "at least one paper is required".to_string(),
            });
        }

        info!("Generating BibTeX for {} papers", input.papers.len());

        let citations = input
            .papers
            .iter()
            .map(|paper| {
                let (year, _) = publication_date(&paper.published);
                Citation {
                    id: paper.id.clone(),
                    key: citation_key(&paper.authors, &paper.title, year),
                    bibtex: paper_to_bibtex(paper),
                }
            })
            .collect();

        Ok(BibliographyResult {
            citations,
            bibliography: papers_to_bibtex_file(&input.papers),
        })
    }
}
