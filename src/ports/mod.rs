//! # Ports Module
//!
//! Interfaces the summarization core needs from the outside world. The
//! [`Summarizer`](crate::summary::Summarizer) only sees these traits, so the
//! HTTP-backed adapters can be swapped for counting mocks in tests.
//!
//! - [`FullTextPort`]: best-available plain text of a paper, or nothing
//! - [`GenerativeModelPort`]: one structured-output completion
//!
//! ## Example Usage
//!
//! ```no_run
//! use arxiv_digest::client::ArxivId;
//! use arxiv_digest::ports::FullTextPort;
//! use std::sync::Arc;
//!
//! async fn full_text_or_abstract(
//!     retriever: Arc<dyn FullTextPort>,
//!     id: &ArxivId,
//!     abstract_text: &str,
//! ) -> String {
//!     retriever
//!         .fetch_full_text(id)
//!         .await
//!         .unwrap_or_else(|| abstract_text.to_string())
//! }
//! ```

pub mod full_text;
pub mod generative_model;

pub use full_text::FullTextPort;
pub use generative_model::{GenerativeModelPort, StructuredRequest};
