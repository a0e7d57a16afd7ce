use arxiv_digest::client::build_http_client;
use arxiv_digest::config::{ArxivConfig, RetrieverConfig};
use arxiv_digest::repositories::Repository;
use arxiv_digest::retrieval::pdf::extract_pdf_text;
use arxiv_digest::retrieval::{normalize_whitespace, TRUNCATION_MARKER};
use arxiv_digest::{ArxivId, CacheRepository, FullTextRetriever, RetrievalSource};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

fn arxiv_config(server: &MockServer) -> ArxivConfig {
    ArxivConfig {
        api_base: format!("{}/api/query", server.uri()),
        abs_base: format!("{}/abs", server.uri()),
        pdf_base: format!("{}/pdf", server.uri()),
        html_base: format!("{}/html", server.uri()),
        ..ArxivConfig::default()
    }
}

fn retriever(server: &MockServer, config: RetrieverConfig) -> FullTextRetriever {
    let arxiv = arxiv_config(server);
    FullTextRetriever::new(build_http_client(&arxiv).unwrap(), &arxiv, config)
}

fn paper_id() -> ArxivId {
    ArxivId::new("2301.00001").unwrap()
}

fn rendering(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|i| format!("<p>Paragraph {i} explains how attention replaces recurrence.</p>"))
        .collect();
    format!(
        "<html><head><title>x</title></head><body><nav>Skip to content</nav>\
         <article><h1>Attention Is All You Need</h1>{body}</article>\
         <script>var tracker = 1;</script></body></html>"
    )
}

fn landing_page() -> String {
    "<html><body><h1 class=\"title\">A paper</h1>\
     <blockquote class=\"abstract\"><span class=\"descriptor\">Abstract:</span> \
     We study   attention.\n Results are strong.</blockquote></body></html>"
        .to_string()
}

/// Single-page PDF whose only text is `text`
fn pdf_with_text(text: &str) -> Vec<u8> {
    pdf_with_pages(&[text])
}

/// One page per entry; an empty entry becomes a page with no text operators
fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(texts.len());
    for text in texts {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[tokio::test]
async fn test_html_rendering_is_preferred() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rendering(40), HTML))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pdf/2301.00001"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let retrieved = retriever(&server, RetrieverConfig::default())
        .retrieve(&paper_id())
        .await
        .expect("html rendering should be used");

    assert_eq!(retrieved.source, RetrievalSource::HtmlRendering);
    assert!(retrieved.text.starts_with("Attention Is All You Need"));
    assert!(retrieved.text.contains("Paragraph 39 explains"));
    assert!(!retrieved.text.contains("tracker"));
    assert!(!retrieved.text.contains("Skip to content"));
}

#[tokio::test]
async fn test_second_retrieval_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rendering(40), HTML))
        .expect(1)
        .mount(&server)
        .await;

    let retriever = retriever(&server, RetrieverConfig::default());
    let first = retriever.retrieve(&paper_id()).await.unwrap();

    // Versioned form of the same paper shares the entry
    let versioned = ArxivId::new("2301.00001v2").unwrap();
    let second = retriever.retrieve(&versioned).await.unwrap();

    assert_eq!(second.source, RetrievalSource::Cache);
    assert_eq!(first.text, second.text);
    assert_eq!(retriever.cache().cache_stats().await.hits, 1);
}

#[tokio::test]
async fn test_short_rendering_falls_through_to_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rendering(1), HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pdf/2301.00001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(pdf_with_text("Hello from the PDF"), "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let retrieved = retriever(&server, RetrieverConfig::default())
        .retrieve(&paper_id())
        .await
        .unwrap();

    assert_eq!(retrieved.source, RetrievalSource::Pdf);
    assert!(retrieved.text.contains("Hello from the PDF"), "got: {}", retrieved.text);
}

#[tokio::test]
async fn test_disabled_html_goes_straight_to_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rendering(40), HTML))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pdf/2301.00001"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(pdf_with_text("Direct PDF"), "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = RetrieverConfig {
        use_html_rendering: false,
        ..RetrieverConfig::default()
    };
    let retrieved = retriever(&server, config).retrieve(&paper_id()).await.unwrap();

    assert_eq!(retrieved.source, RetrievalSource::Pdf);
}

#[tokio::test]
async fn test_html_error_page_at_pdf_url_falls_back_to_abstract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf/2301.00001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Too many requests</body></html>", HTML),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/abs/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(landing_page(), HTML))
        .expect(1)
        .mount(&server)
        .await;

    let retrieved = retriever(&server, RetrieverConfig::default())
        .retrieve(&paper_id())
        .await
        .unwrap();

    assert_eq!(retrieved.source, RetrievalSource::AbstractPage);
    assert_eq!(retrieved.text, "We study attention. Results are strong.");
}

#[tokio::test]
async fn test_long_text_is_truncated_with_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rendering(200), HTML))
        .mount(&server)
        .await;

    let config = RetrieverConfig {
        max_content_chars: 1_500,
        ..RetrieverConfig::default()
    };
    let retrieved = retriever(&server, config).retrieve(&paper_id()).await.unwrap();

    assert!(retrieved.text.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        retrieved.text.chars().count(),
        1_500 + TRUNCATION_MARKER.chars().count()
    );
}

#[test]
fn test_pages_without_text_are_skipped() {
    let bytes = pdf_with_pages(&["First page", "", "Third page"]);

    let text = extract_pdf_text(&bytes).unwrap();

    assert_eq!(normalize_whitespace(&text), "First page\n\nThird page");
}

#[tokio::test]
async fn test_long_pdf_is_truncated_with_marker() {
    let server = MockServer::start().await;
    let sentence = "Attention replaces recurrence in sequence transduction. ";
    let long_page = sentence.repeat(20);
    Mock::given(method("GET"))
        .and(path("/pdf/2301.00001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(pdf_with_pages(&[&long_page, "", &long_page]), "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = RetrieverConfig {
        use_html_rendering: false,
        max_content_chars: 200,
        ..RetrieverConfig::default()
    };
    let retrieved = retriever(&server, config).retrieve(&paper_id()).await.unwrap();

    assert_eq!(retrieved.source, RetrievalSource::Pdf);
    assert!(retrieved.text.starts_with("Attention replaces recurrence"));
    assert!(retrieved.text.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        retrieved.text.chars().count(),
        200 + TRUNCATION_MARKER.chars().count()
    );
}

#[tokio::test]
async fn test_every_source_failing_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let retriever = retriever(&server, RetrieverConfig::default());
    assert!(retriever.retrieve(&paper_id()).await.is_none());
    assert!(retriever.cache().is_empty().await);
}

#[tokio::test]
async fn test_landing_abstract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/abs/2301.00001"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(landing_page(), HTML))
        .mount(&server)
        .await;

    let retriever = retriever(&server, RetrieverConfig::default());
    let text = retriever.landing_abstract(&paper_id()).await.unwrap();
    assert_eq!(text, "We study attention. Results are strong.");
    assert!(retriever.cache().is_empty().await);
}
