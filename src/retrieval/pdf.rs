//! PDF detection and text extraction
//!
//! `lopdf` parsing is CPU-bound, so it runs on the blocking pool behind a
//! semaphore and a timeout instead of on the async workers.

use crate::resilience::TimeoutWrapper;
use crate::{Error, Result};
use lopdf::Document;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Whether a response is a PDF, judged by its content type or its leading bytes
///
/// arXiv answers some PDF URLs with a 200 HTML page (withdrawn papers,
/// "being processed" notices), so the status alone proves nothing.
#[must_use]
pub fn looks_like_pdf(content_type: Option<&str>, body: &[u8]) -> bool {
    let declared = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("pdf"));
    declared || body.starts_with(PDF_MAGIC)
}

/// Extract text page by page; blocking
///
/// Pages that fail to decode, or decode to nothing, are skipped. The pages
/// that do decode are joined with blank lines.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes).map_err(|e| Error::Parse {
        context: "pdf".to_string(),
        message: format!("lopdf failed to open document: {e}"),
    })?;

    let pages = document.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => debug!("PDF page {} has no extractable text", page_number),
            Err(e) => debug!("PDF page {} failed to extract: {}", page_number, e),
        }
    }

    debug!("Extracted text from {}/{} PDF pages", texts.len(), pages.len());
    Ok(texts.join("\n\n"))
}

/// Bounded hand-off of PDF parsing to the blocking pool
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    permits: Arc<Semaphore>,
    timeout: TimeoutWrapper,
}

impl PdfExtractor {
    /// Allow `max_parallel` extractions at once, each limited to `timeout`
    #[must_use]
    pub fn new(max_parallel: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_parallel.max(1))),
            timeout: TimeoutWrapper::new("pdf extraction", timeout),
        }
    }

    /// Extract text from a downloaded PDF without blocking the async workers
    ///
    /// The timeout covers the wait for a permit as well as the parse. A parse
    /// that overruns keeps its permit until the blocking thread finishes.
    pub async fn extract(&self, bytes: Vec<u8>) -> Result<String> {
        let permits = Arc::clone(&self.permits);

        self.timeout
            .execute(|| async move {
                let permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Service(format!("extraction pool closed: {e}")))?;

                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    extract_pdf_text(&bytes)
                })
                .await
                .map_err(|e| Error::Service(format!("PDF extraction task failed: {e}")))?
            })
            .await
    }
}
