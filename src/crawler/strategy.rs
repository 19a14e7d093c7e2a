//! Retrieval strategies
//!
//! A site path can be fetched two ways:
//!
//! - **Direct**: load `base-url + path` and read the served document
//! - **Rendered**: load `dynamic-base-url + urlencode(path)`, give client-side
//!   rendering time to settle, and wait briefly for the content region
//!
//! Both end in the same extraction step. A strategy returns `Ok` with a
//! [`Retrieval`] describing what it found, or `Err` when the page could not be
//! fetched at all. The processor tries the other strategy only in the first
//! case.

use async_trait::async_trait;
use std::fmt;
use url::Url;

use super::convert::Converter;
use super::extractor::Extractor;
use super::renderer::{Page, WaitUntil};
use crate::config::FetchTimings;
use crate::state::ItemError;
use crate::url::{title_from_path, SiteUrls};

/// One of the two retrieval methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    Rendered,
}

impl Strategy {
    /// The strategy to fall back to
    pub fn other(&self) -> Self {
        match self {
            Self::Direct => Self::Rendered,
            Self::Rendered => Self::Direct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Rendered => "rendered",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully converted document, ready for the quality gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub title: String,
    pub markdown: String,
    pub source_url: String,
    pub path: String,
    pub strategy: Strategy,
}

/// Outcome of a strategy that managed to load its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Usable content was extracted
    Found(FetchResult),
    /// The page signalled a missing document
    NotFound,
    /// The page loaded but held no usable article
    NoContent,
}

/// Fetches one site path with one strategy
#[async_trait]
pub trait Retriever: Send + Sync {
    /// URL the given strategy loads for `path`
    fn url_for(&self, strategy: Strategy, path: &str) -> String;

    /// Strategy that produced a previously recorded URL
    fn strategy_of(&self, url: &str) -> Strategy;

    /// Loads `path` on `page` using `strategy`
    ///
    /// # Returns
    ///
    /// * `Ok(Retrieval)` - The page loaded; it may or may not have held content
    /// * `Err(ItemError)` - Navigation timed out or failed
    async fn retrieve(
        &self,
        page: &mut dyn Page,
        strategy: Strategy,
        path: &str,
    ) -> Result<Retrieval, ItemError>;
}

/// The direct and rendered strategies sharing one extraction step
pub struct StrategySet {
    urls: SiteUrls,
    timings: FetchTimings,
    extractor: Box<dyn Extractor>,
    converter: Box<dyn Converter>,
}

impl StrategySet {
    pub fn new(
        urls: SiteUrls,
        timings: FetchTimings,
        extractor: Box<dyn Extractor>,
        converter: Box<dyn Converter>,
    ) -> Self {
        Self {
            urls,
            timings,
            extractor,
            converter,
        }
    }

    async fn direct(&self, page: &mut dyn Page, path: &str) -> Result<Retrieval, ItemError> {
        let url = self.urls.direct_url(path);

        page.goto(&url, WaitUntil::Minimal, self.timings.navigation_timeout)
            .await
            .map_err(|e| ItemError::from_render(&url, e))?;
        tokio::time::sleep(self.timings.direct_settle).await;

        if page.status() == Some(404) {
            tracing::debug!(path = %path, "Direct fetch returned HTTP 404");
            return Ok(Retrieval::NotFound);
        }

        let title = page
            .title()
            .await
            .map_err(|e| ItemError::from_render(&url, e))?
            .unwrap_or_default();
        if is_not_found_title(&title) {
            tracing::debug!(path = %path, title = %title, "Direct fetch landed on a not-found page");
            return Ok(Retrieval::NotFound);
        }

        let html = page
            .html()
            .await
            .map_err(|e| ItemError::from_render(&url, e))?;
        self.finish(Strategy::Direct, path, &url, &html)
    }

    async fn rendered(&self, page: &mut dyn Page, path: &str) -> Result<Retrieval, ItemError> {
        let url = self.urls.dynamic_url(path);

        page.goto(&url, WaitUntil::Minimal, self.timings.navigation_timeout)
            .await
            .map_err(|e| ItemError::from_render(&url, e))?;
        tokio::time::sleep(self.timings.render_settle).await;

        // Missing content region is not fatal; extract whatever rendered
        match page
            .wait_for_selector(&self.timings.content_selector, self.timings.selector_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!(path = %path, "Content region did not appear"),
            Err(e) => tracing::debug!(path = %path, "Waiting for content region failed: {}", e),
        }

        let html = page
            .html()
            .await
            .map_err(|e| ItemError::from_render(&url, e))?;
        self.finish(Strategy::Rendered, path, &url, &html)
    }

    /// Shared extraction and conversion
    fn finish(
        &self,
        strategy: Strategy,
        path: &str,
        url: &str,
        html: &str,
    ) -> Result<Retrieval, ItemError> {
        let base_url = Url::parse(url).map_err(|e| ItemError::FetchFailure {
            url: url.to_string(),
            message: format!("invalid page URL: {}", e),
        })?;

        let Some(extracted) = self.extractor.extract(html, &base_url) else {
            return Ok(Retrieval::NoContent);
        };

        let markdown = self.converter.to_markdown(&extracted.content_html);
        let title = extracted.title.unwrap_or_else(|| title_from_path(path));

        tracing::debug!(
            path = %path,
            strategy = %strategy,
            text_len = extracted.text_len,
            markdown_len = markdown.len(),
            "Content extracted"
        );

        Ok(Retrieval::Found(FetchResult {
            title,
            markdown,
            source_url: url.to_string(),
            path: path.to_string(),
            strategy,
        }))
    }
}

#[async_trait]
impl Retriever for StrategySet {
    fn url_for(&self, strategy: Strategy, path: &str) -> String {
        match strategy {
            Strategy::Direct => self.urls.direct_url(path),
            Strategy::Rendered => self.urls.dynamic_url(path),
        }
    }

    fn strategy_of(&self, url: &str) -> Strategy {
        if self.urls.is_dynamic_url(url) {
            Strategy::Rendered
        } else {
            Strategy::Direct
        }
    }

    async fn retrieve(
        &self,
        page: &mut dyn Page,
        strategy: Strategy,
        path: &str,
    ) -> Result<Retrieval, ItemError> {
        match strategy {
            Strategy::Direct => self.direct(page, path).await,
            Strategy::Rendered => self.rendered(page, path).await,
        }
    }
}

fn is_not_found_title(title: &str) -> bool {
    title.contains("404") || title.contains("Not Found")
}
