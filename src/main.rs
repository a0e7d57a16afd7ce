use anyhow::{bail, Context, Result};
use arxiv_digest::client::providers::{SearchContext, SortBy};
use arxiv_digest::tools::bibliography::BibliographyInput;
use arxiv_digest::tools::search::SearchInput;
use arxiv_digest::tools::summarize::SummarizeInput;
use arxiv_digest::{AppContext, ArxivId, Config, ConfigOverrides, Server};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// arXiv paper digest: search, read and summarize papers over MCP
#[derive(Parser, Debug)]
#[command(name = "arxiv-digest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search arXiv and summarize papers at three levels of detail", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Model name for summaries
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible chat completions endpoint
    #[arg(long, global = true)]
    llm_base_url: Option<String>,

    /// Maximum characters of full text handed to the model
    #[arg(long, global = true)]
    max_content_chars: Option<usize>,

    /// Skip the arXiv HTML rendering and go straight to the PDF
    #[arg(long, global = true)]
    no_html: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortArg {
    Relevance,
    Updated,
    Submitted,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Relevance => Self::Relevance,
            SortArg::Updated => Self::LastUpdatedDate,
            SortArg::Submitted => Self::SubmittedDate,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Search arXiv
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(long, short, default_value_t = 10)]
        max_results: u32,

        /// Result ordering
        #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
        sort_by: SortArg,
    },

    /// Summarize one paper
    Summarize {
        /// arXiv identifier
        id: String,

        /// Detail level: 1 = overview, 2 = technical digest, 3 = comprehensive review
        #[arg(long, short, default_value_t = 1)]
        level: u8,
    },

    /// Print the best available full text of a paper
    Fetch {
        /// arXiv identifier
        id: String,
    },

    /// Print a BibTeX file for the given papers
    Bibtex {
        /// arXiv identifiers
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            llm_model: self.model.clone(),
            llm_base_url: self.llm_base_url.clone(),
            max_content_chars: self.max_content_chars,
            use_html_rendering: self.no_html.then_some(false),
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the MCP protocol
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(&cli.overrides());
    config.validate().context("Invalid configuration")?;

    let context = AppContext::new(config).context("Failed to initialize application")?;

    let outcome = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(context).await,
        Commands::Search {
            query,
            max_results,
            sort_by,
        } => search(&context, query, max_results, sort_by.into()).await,
        Commands::Summarize { id, level } => summarize(&context, &id, level).await,
        Commands::Fetch { id } => fetch(&context, &id).await,
        Commands::Bibtex { ids } => bibtex(&context, &ids).await,
    };

    if let Err(ref e) = outcome {
        error!("{:#}", e);
    }
    outcome
}

async fn serve(context: AppContext) -> Result<()> {
    info!(
        "Starting {} v{}",
        context.config.server.name,
        env!("CARGO_PKG_VERSION")
    );
    let server = Server::new(Arc::new(context));
    server.run().await.context("MCP server failed")
}

async fn search(context: &AppContext, query: String, max_results: u32, sort_by: SortBy) -> Result<()> {
    let result = context
        .search_tool
        .search_papers(SearchInput {
            query,
            max_results,
            sort_by,
        })
        .await?;

    println!("Found {} papers for '{}'", result.count, result.query);
    for paper in &result.papers {
        println!();
        println!("[{}] {}", paper.id, paper.title);
        println!("  {}", paper.authors.join(", "));
        println!("  {}", paper.abs_url);
    }
    Ok(())
}

async fn summarize(context: &AppContext, raw_id: &str, level: u8) -> Result<()> {
    let id = ArxivId::new(raw_id)?;
    let search_context = SearchContext::with_timeout(context.config.arxiv.search_timeout());

    let abstract_text = match context.provider.lookup(std::slice::from_ref(&id), &search_context).await {
        Ok(papers) if !papers.is_empty() => papers[0].abstract_text.clone(),
        Ok(_) => context.retriever.landing_abstract(&id).await?,
        Err(e) => {
            info!("API lookup failed for {} ({}), reading the landing page", id, e);
            context.retriever.landing_abstract(&id).await?
        }
    };

    let result = context
        .summarize_tool
        .summarize(SummarizeInput {
            abstract_text,
            level,
            paper_id: Some(id.to_string()),
        })
        .await?;

    println!("{}", result.summary);
    Ok(())
}

async fn fetch(context: &AppContext, raw_id: &str) -> Result<()> {
    let id = ArxivId::new(raw_id)?;
    let Some(retrieved) = context.retriever.retrieve(&id).await else {
        bail!("No text could be retrieved for {id}");
    };

    info!("Text for {} came from {}", id, retrieved.source);
    println!("{}", retrieved.text);
    Ok(())
}

async fn bibtex(context: &AppContext, raw_ids: &[String]) -> Result<()> {
    let ids = raw_ids
        .iter()
        .map(|raw| ArxivId::new(raw))
        .collect::<arxiv_digest::Result<Vec<_>>>()?;

    let search_context = SearchContext::with_timeout(context.config.arxiv.search_timeout());
    let papers = context.provider.lookup(&ids, &search_context).await?;
    if papers.len() < ids.len() {
        info!("{} of {} identifiers resolved", papers.len(), ids.len());
    }

    let result = context.bibliography_tool.export(&BibliographyInput { papers })?;
    println!("{}", result.bibliography);
    Ok(())
}
