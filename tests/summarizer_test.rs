use arxiv_digest::config::{LlmConfig, SummaryConfig};
use arxiv_digest::summary::placeholder;
use arxiv_digest::tools::summarize::{BatchSummarizeInput, SummarizeAllInput, SummarizeInput};
use arxiv_digest::{
    ArxivId, CacheRepository, Error, FullTextPort, GenerativeModelPort, PaperMetadata, Result,
    StructuredRequest, Summarizer, SummarizeTool,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const ABSTRACT: &str = "We introduce the Transformer, a sequence transduction model based \
entirely on attention, dispensing with recurrence and convolutions. It reaches 28.4 BLEU \
on WMT 2014 English-to-German translation while training in a fraction of the time.";

const BULLETS: &str = "- **Problem:** translation models are slow to train\n\
- **Approach:** replace recurrence with *attention*\n\
- **Why it matters:** faster training and better scores";

/// Full-text source that counts calls and returns a fixed body
#[derive(Default)]
struct CountingRetriever {
    calls: AtomicUsize,
    text: Option<String>,
}

impl CountingRetriever {
    fn with_text(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            text: Some(text.to_string()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullTextPort for CountingRetriever {
    async fn fetch_full_text(&self, _id: &ArxivId) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text.clone()
    }
}

/// Model that records prompts and fails whenever the prompt contains `fail_on`
struct ScriptedModel {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    reply: String,
    fail_on: Option<String>,
}

impl ScriptedModel {
    fn replying(summary: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            reply: serde_json::json!({ "summary_markdown": summary }).to_string(),
            fail_on: None,
        }
    }

    fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeModelPort for ScriptedModel {
    async fn complete_structured(&self, request: &StructuredRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user_prompt.clone());

        if let Some(marker) = &self.fail_on {
            if request.user_prompt.contains(marker.as_str()) {
                return Err(Error::Llm {
                    status: 500,
                    message: "scripted failure".to_string(),
                });
            }
        }
        Ok(self.reply.clone())
    }
}

fn summarizer(retriever: Arc<CountingRetriever>, model: Arc<ScriptedModel>) -> Summarizer {
    Summarizer::new(retriever, model, &LlmConfig::default(), &SummaryConfig::default())
}

fn tool(retriever: Arc<CountingRetriever>, model: Arc<ScriptedModel>) -> SummarizeTool {
    SummarizeTool::new(
        Arc::new(summarizer(retriever, model)),
        SummaryConfig::default(),
    )
}

fn paper(id: &str, abstract_text: &str) -> PaperMetadata {
    PaperMetadata::new(&ArxivId::new(id).unwrap(), abstract_text)
}

#[tokio::test]
async fn test_level_one_reads_only_the_abstract() {
    let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT"));
    let model = Arc::new(ScriptedModel::replying(BULLETS));
    let summarizer = summarizer(retriever.clone(), model.clone());

    let summary = summarizer
        .generate_summary(ABSTRACT, 1, Some("1706.03762"))
        .await
        .unwrap();

    assert_eq!(summary, BULLETS);
    assert_eq!(retriever.calls(), 0);
    assert_eq!(model.calls(), 1);

    let prompt = model.last_prompt();
    assert!(prompt.contains("3-4 SHORT markdown bullet points"));
    assert!(prompt.contains(ABSTRACT));
    assert!(!prompt.contains("FULL TEXT"));
}

#[tokio::test]
async fn test_level_one_without_identifier() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying(BULLETS));

    let result = tool(retriever.clone(), model.clone())
        .summarize(SummarizeInput {
            abstract_text: ABSTRACT.to_string(),
            level: 1,
            paper_id: None,
        })
        .await
        .unwrap();

    assert_eq!(result.level, 1);
    assert!(result.summary.lines().all(|line| line.starts_with("- ")));
    assert!(result.summary.contains("**"));
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn test_deeper_levels_retrieve_full_text_once() {
    for level in [2u8, 3] {
        let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT OF THE PAPER"));
        let model = Arc::new(ScriptedModel::replying("**Main Findings** text"));
        let summarizer = summarizer(retriever.clone(), model.clone());

        summarizer
            .generate_summary(ABSTRACT, level, Some("1706.03762v5"))
            .await
            .unwrap();

        assert_eq!(retriever.calls(), 1, "level {level}");
        assert_eq!(model.calls(), 1, "level {level}");
        let prompt = model.last_prompt();
        assert!(prompt.contains("FULL TEXT OF THE PAPER"));
        assert!(prompt.contains("Full Paper Text:"));
    }
}

#[tokio::test]
async fn test_missing_full_text_falls_back_to_abstract() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying("digest"));
    let summarizer = summarizer(retriever.clone(), model.clone());

    let summary = summarizer
        .generate_summary(ABSTRACT, 2, Some("1706.03762"))
        .await
        .unwrap();

    assert_eq!(summary, "digest");
    assert_eq!(retriever.calls(), 1);
    assert!(model.last_prompt().contains(ABSTRACT));
}

#[tokio::test]
async fn test_repeated_calls_hit_the_cache() {
    let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT"));
    let model = Arc::new(ScriptedModel::replying("cached digest"));
    let summarizer = summarizer(retriever.clone(), model.clone());

    let first = summarizer
        .generate_summary(ABSTRACT, 2, Some("1706.03762"))
        .await
        .unwrap();
    // Different version and different abstract: same paper, same level
    let second = summarizer
        .generate_summary("another abstract entirely", 2, Some("arXiv:1706.03762v2"))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(retriever.calls(), 1);
    assert_eq!(model.calls(), 1);
    assert_eq!(summarizer.cache().cache_stats().await.hits, 1);

    // Level 1 is keyed by the abstract text
    summarizer.generate_summary(ABSTRACT, 1, None).await.unwrap();
    summarizer.generate_summary(ABSTRACT, 1, None).await.unwrap();
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_model_failures_are_not_cached() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying("unused").failing_on("Abstract:"));
    let summarizer = summarizer(retriever, model.clone());

    for _ in 0..2 {
        let result = summarizer.generate_summary(ABSTRACT, 1, None).await;
        assert!(matches!(result, Err(Error::Llm { status: 500, .. })));
    }
    assert_eq!(model.calls(), 2);
    assert_eq!(summarizer.cache().cache_stats().await.inserts, 0);
}

#[tokio::test]
async fn test_validation_errors() {
    let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT"));
    let model = Arc::new(ScriptedModel::replying("never"));
    let tool = tool(retriever.clone(), model.clone());

    let missing_id = tool
        .summarize(SummarizeInput {
            abstract_text: ABSTRACT.to_string(),
            level: 2,
            paper_id: None,
        })
        .await;
    assert!(matches!(missing_id, Err(Error::MissingIdentifier { level: 2 })));

    let short = tool
        .summarize(SummarizeInput {
            abstract_text: "x".repeat(49),
            level: 1,
            paper_id: None,
        })
        .await;
    assert!(matches!(short, Err(Error::InvalidInput { ref field, .. }) if field == "abstract"));

    let long = tool
        .summarize(SummarizeInput {
            abstract_text: "x".repeat(10_001),
            level: 1,
            paper_id: None,
        })
        .await;
    assert!(matches!(long, Err(Error::InvalidInput { ref field, .. }) if field == "abstract"));

    // Level is checked before anything else
    let bad_level = tool
        .summarize(SummarizeInput {
            abstract_text: "short".to_string(),
            level: 4,
            paper_id: None,
        })
        .await;
    assert!(matches!(bad_level, Err(Error::InvalidLevel { level: 4 })));

    assert_eq!(retriever.calls(), 0);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_exactly_fifty_chars_is_accepted() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying(BULLETS));

    let result = tool(retriever, model)
        .summarize(SummarizeInput {
            abstract_text: "y".repeat(50),
            level: 1,
            paper_id: None,
        })
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_all_levels_reports_unavailable_levels() {
    let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT"));
    let model = Arc::new(ScriptedModel::replying(BULLETS));

    let result = tool(retriever.clone(), model.clone())
        .summarize_all_levels(SummarizeAllInput {
            abstract_text: ABSTRACT.to_string(),
            paper_id: None,
        })
        .await
        .unwrap();

    assert_eq!(result.summaries.len(), 3);
    assert_eq!(result.summaries[&1], BULLETS);
    assert_eq!(result.summaries[&2], placeholder(2));
    assert_eq!(result.summaries[&3], placeholder(3));
    assert_eq!(retriever.calls(), 0);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_all_levels_with_identifier() {
    let retriever = Arc::new(CountingRetriever::with_text("FULL TEXT"));
    let model = Arc::new(ScriptedModel::replying("summary"));

    let result = tool(retriever.clone(), model.clone())
        .summarize_all_levels(SummarizeAllInput {
            abstract_text: ABSTRACT.to_string(),
            paper_id: Some("1706.03762".to_string()),
        })
        .await
        .unwrap();

    assert!(result.summaries.values().all(|s| s == "summary"));
    // Levels 2 and 3 each retrieve; the retriever owns its own cache
    assert_eq!(retriever.calls(), 2);
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_batch_with_one_failure() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying("fine").failing_on("POISON"));

    let papers = vec![
        paper("2301.00001", "First abstract about graph neural networks."),
        paper("2301.00002", "Second abstract, POISON pill for the model."),
        paper("2301.00003", "Third abstract about diffusion models."),
    ];

    let result = tool(retriever, model.clone())
        .batch_summarize(BatchSummarizeInput { papers, level: 1 })
        .await
        .unwrap();

    assert_eq!(result.summaries.len(), 3);
    assert_eq!(result.summaries["2301.00001"], "fine");
    assert_eq!(result.summaries["2301.00002"], placeholder(1));
    assert_eq!(result.summaries["2301.00003"], "fine");
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_batch_deduplicates_ids() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying("fine"));

    let papers = vec![
        paper("2301.00001", "Same paper listed twice in a result set."),
        paper("2301.00001", "Same paper listed twice in a result set."),
    ];

    let result = tool(retriever, model.clone())
        .batch_summarize(BatchSummarizeInput { papers, level: 1 })
        .await
        .unwrap();

    assert_eq!(result.summaries.len(), 1);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_batch_size_limits() {
    let retriever = Arc::new(CountingRetriever::default());
    let model = Arc::new(ScriptedModel::replying("fine"));
    let tool = tool(retriever, model.clone());

    let empty = tool
        .batch_summarize(BatchSummarizeInput {
            papers: Vec::new(),
            level: 1,
        })
        .await;
    assert!(matches!(empty, Err(Error::InvalidInput { ref field, .. }) if field == "papers"));

    let papers = (0..21)
        .map(|i| paper(&format!("2301.{i:05}"), "abstract"))
        .collect();
    let too_many = tool
        .batch_summarize(BatchSummarizeInput { papers, level: 1 })
        .await;
    assert!(matches!(too_many, Err(Error::InvalidInput { .. })));

    let bad_level = tool
        .batch_summarize(BatchSummarizeInput {
            papers: vec![paper("2301.00001", "abstract")],
            level: 0,
        })
        .await;
    assert!(matches!(bad_level, Err(Error::InvalidLevel { level: 0 })));
    assert_eq!(model.calls(), 0);
}
