//! Main content extraction
//!
//! Both retrieval strategies funnel their HTML through the same extractor:
//! boilerplate regions are removed, the readability heuristic picks the
//! article, and a selector probe over likely content containers is used when
//! the heuristic comes up short.

use scraper::{Html, Selector};
use std::io::Cursor;
use url::Url;

use super::renderer::document_title;

/// Regions removed before extraction
pub const BOILERPLATE_SELECTOR: &str = "nav, .nav, .navigation, .sidebar, .header, .footer, \
     .menu, .breadcrumb, .pagination, script, style, .advertisement, .ad, .social-share";

/// Containers probed when the readability heuristic finds no article
pub const FALLBACK_SELECTOR: &str =
    ".dynamic-markdown-component, main, article, .content, .markdown-body";

/// Main content of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Article title, when one was found
    pub title: Option<String>,
    /// Retained HTML subtree
    pub content_html: String,
    /// Character count of the trimmed article text
    pub text_len: usize,
}

/// Finds the main content of an HTML document
pub trait Extractor: Send + Sync {
    /// Returns `None` when no article with enough text was found
    fn extract(&self, html: &str, base_url: &Url) -> Option<Extracted>;
}

/// Readability-based extractor with a selector fallback
#[derive(Debug, Clone)]
pub struct ReadabilityExtractor {
    min_text_chars: usize,
}

impl ReadabilityExtractor {
    /// Creates an extractor that rejects articles under `min_text_chars` characters
    pub fn new(min_text_chars: usize) -> Self {
        Self { min_text_chars }
    }
}

impl Extractor for ReadabilityExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Option<Extracted> {
        let stripped = strip_boilerplate(html);

        let mut cursor = Cursor::new(stripped.as_bytes());
        let article = match readability::extractor::extract(&mut cursor, base_url) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::debug!(url = %base_url, "Readability failed: {}", e);
                None
            }
        };

        if let Some(product) = article {
            let text_len = product.text.trim().chars().count();
            if text_len >= self.min_text_chars {
                return Some(Extracted {
                    title: Some(product.title.trim().to_string()).filter(|t| !t.is_empty()),
                    content_html: product.content,
                    text_len,
                });
            }
            tracing::debug!(url = %base_url, text_len, "Readability article too short, probing containers");
        }

        probe_containers(&stripped).filter(|extracted| extracted.text_len >= self.min_text_chars)
    }
}

/// Removes boilerplate regions and re-serializes the document
fn strip_boilerplate(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(BOILERPLATE_SELECTOR) else {
        return html.to_string();
    };

    let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.html()
}

/// Takes the first likely content container in document order
fn probe_containers(html: &str) -> Option<Extracted> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(FALLBACK_SELECTOR).ok()?;
    let element = document.select(&selector).next()?;

    let text: String = element.text().collect();
    Some(Extracted {
        title: document_title(html),
        content_html: element.inner_html(),
        text_len: text.trim().chars().count(),
    })
}
