//! Start-page link discovery
//!
//! A fresh run is seeded from the links on a single start page. Links are
//! resolved to site paths, filtered by the target prefix and deduplicated in
//! document order.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::renderer::{Page, WaitUntil};
use crate::state::{ItemError, RetryDecision, RetryPolicy};
use crate::url::{site_path_from_href, SiteUrls};
use crate::HarvestError;

/// Timing for loading the start page
#[derive(Debug, Clone)]
pub struct DiscoveryTimings {
    pub navigation_timeout: Duration,
    pub settle: Duration,
}

/// Loads the start page and returns the target site paths it links to
///
/// Navigation failures are retried under the ordinary retry policy, with
/// timeouts escalating the budget as they do for work items.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Deduplicated site paths in document order
/// * `Err(HarvestError::Discovery)` - The start page could not be loaded
/// * `Err(HarvestError::Interrupted)` - The run was cancelled
pub async fn discover_paths(
    page: &mut dyn Page,
    urls: &SiteUrls,
    timings: &DiscoveryTimings,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<String>, HarvestError> {
    let start_url = urls.start_url().to_string();
    let mut budget = retry.budget();

    tracing::info!("Discovering links from {}", start_url);

    loop {
        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HarvestError::Interrupted),
            loaded = load_start_page(page, &start_url, timings) => loaded,
        };

        let error = match loaded {
            Ok(html) => {
                let paths = extract_site_paths(&html, urls);
                tracing::info!("Found {} target links", paths.len());
                return Ok(paths);
            }
            Err(e) => e,
        };

        match budget.record_failure(error.kind()) {
            RetryDecision::Retry { delay, retry } => {
                tracing::warn!(retry, "Loading start page failed: {}", error);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(HarvestError::Interrupted),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            RetryDecision::GiveUp { retries } => {
                return Err(HarvestError::Discovery(format!(
                    "{} (after {} retries)",
                    error, retries
                )));
            }
        }
    }
}

async fn load_start_page(
    page: &mut dyn Page,
    url: &str,
    timings: &DiscoveryTimings,
) -> Result<String, ItemError> {
    page.goto(url, WaitUntil::Idle, timings.navigation_timeout)
        .await
        .map_err(|e| ItemError::from_render(url, e))?;
    tokio::time::sleep(timings.settle).await;
    page.html().await.map_err(|e| ItemError::from_render(url, e))
}

/// Collects target site paths from every `<a href>` on the page
pub fn extract_site_paths(html: &str, urls: &SiteUrls) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        // In-page anchors point back at the start page itself
        if href.trim_start().starts_with('#') {
            continue;
        }

        match site_path_from_href(urls.start_url(), href, urls.mount_prefix()) {
            Ok(path) if urls.is_target(&path) => {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::trace!("Skipping link {}: {}", href, e),
        }
    }

    paths
}
