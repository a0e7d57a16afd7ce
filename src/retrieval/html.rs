//! Text extraction from arXiv HTML renderings and abstract landing pages

use super::text::{collapse_whitespace, normalize_whitespace};
use scraper::{ElementRef, Html, Node, Selector};

/// Containers tried in order when locating the paper body
const ARTICLE_SELECTORS: [&str; 3] = ["article", ".ltx_document", "body"];

/// Elements whose text never belongs to the paper body
const SKIPPED_ELEMENTS: [&str; 9] = [
    "script",
    "style",
    "nav",
    "header",
    "footer",
    "noscript",
    "button",
    "annotation",
    "annotation-xml",
];

const SKIPPED_CLASSES: [&str; 4] = [
    "ltx_bibliography",
    "ltx_page_header",
    "ltx_page_footer",
    "ltx_role_footnote",
];

/// Elements that end a paragraph of extracted text
const BLOCK_ELEMENTS: [&str; 24] = [
    "p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol",
    "table", "tr", "figure", "figcaption", "blockquote", "pre", "dl", "dt", "dd", "br", "hr",
];

const ABSTRACT_SELECTORS: [&str; 3] = [
    "blockquote.abstract",
    ".abstract",
    "meta[name='citation_abstract']",
];

/// Plain text of the main article container, whitespace-normalized
///
/// Returns an empty string when the document has no recognizable body.
#[must_use]
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = ARTICLE_SELECTORS.iter().find_map(|selector| {
        Selector::parse(selector)
            .ok()
            .and_then(|sel| document.select(&sel).next())
    });

    let Some(root) = root else {
        return String::new();
    };

    let mut raw = String::new();
    collect_text(root, &mut raw);
    normalize_whitespace(&raw)
}

fn is_skipped(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    SKIPPED_ELEMENTS.contains(&value.name())
        || value.classes().any(|class| SKIPPED_CLASSES.contains(&class))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_skipped(&child) {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&child.value().name());
                if block {
                    out.push_str("\n\n");
                }
                collect_text(child, out);
                if block {
                    out.push_str("\n\n");
                }
            }
            _ => {}
        }
    }
}

/// Abstract paragraph of an arXiv landing page, without its label
#[must_use]
pub fn extract_abstract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    ABSTRACT_SELECTORS.iter().find_map(|selector| {
        Selector::parse(selector).ok().and_then(|sel| {
            document.select(&sel).find_map(|element| {
                let raw = if selector.starts_with("meta") {
                    element.value().attr("content")?.to_string()
                } else {
                    element.text().collect::<String>()
                };

                let text = collapse_whitespace(strip_abstract_label(&raw));
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            })
        })
    })
}

fn strip_abstract_label(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.get(..9) {
        Some(label) if label.eq_ignore_ascii_case("abstract:") => &trimmed[9..],
        _ => trimmed,
    }
}
