//! # Full Text Port

use crate::client::ArxivId;
use async_trait::async_trait;

/// Source of a paper's plain-text body
///
/// Implementations decide where the text comes from and may degrade to a
/// shorter representation (such as the scraped abstract). Unavailability is
/// `None`, never an error; implementations log why each source failed.
#[async_trait]
pub trait FullTextPort: Send + Sync {
    /// Best-available plain text for `id`, or `None` when nothing could be retrieved
    async fn fetch_full_text(&self, id: &ArxivId) -> Option<String>;
}
