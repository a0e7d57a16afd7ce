//! arXiv paper digest: search, full-text retrieval and leveled summaries
//!
//! The crate is organised the same way the MCP server is wired:
//! providers and clients talk to the outside world, [`retrieval`] turns
//! documents into text, [`summary`] turns text into markdown summaries,
//! and [`tools`] validates requests before they reach either.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod ports;
pub mod repositories;
pub mod resilience;
pub mod retrieval;
pub mod server;
pub mod summary;
pub mod tools;

pub use app::AppContext;
pub use client::{ArxivId, ArxivProvider, ChatCompletionClient, PaperMetadata};
pub use config::{Config, ConfigOverrides};
pub use error::{Error, Result};
pub use ports::{FullTextPort, GenerativeModelPort, StructuredRequest};
pub use repositories::{CacheRepository, CacheStats, InMemoryCacheRepository, Repository};
pub use resilience::{TimeoutExt, TimeoutWrapper};
pub use retrieval::{FullTextRetriever, RetrievalSource, RetrievedText};
pub use server::Server;
pub use summary::{DetailLevel, Summarizer};
pub use tools::{BibliographyTool, SearchTool, SummarizeTool};
