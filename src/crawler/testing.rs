//! Fakes shared by the crawler unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::renderer::{Page, RenderError, Renderer, WaitUntil};
use super::strategy::{FetchResult, Retrieval, Retriever, Strategy};
use crate::config::{
    FetchTimings, PipelineSettings, QualityMode, QualityThresholds, StrategyPriority,
};
use crate::state::{ItemError, RetryPolicy};

type Script = dyn Fn(&str, Strategy, u32) -> Result<Retrieval, ItemError> + Send + Sync;

/// Page that does nothing; used with retrievers that ignore the page
pub struct NullPage;

#[async_trait]
impl Page for NullPage {
    async fn goto(&mut self, _: &str, _: WaitUntil, _: Duration) -> Result<(), RenderError> {
        Ok(())
    }

    async fn html(&self) -> Result<String, RenderError> {
        Ok(String::new())
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        Ok(None)
    }

    fn status(&self) -> Option<u16> {
        None
    }

    async fn wait_for_selector(&mut self, _: &str, _: Duration) -> Result<bool, RenderError> {
        Ok(false)
    }

    async fn close(self: Box<Self>) {}
}

/// Renderer handing out [`NullPage`]s, optionally failing to open them
pub struct NullRenderer {
    pub fail_open: bool,
}

#[async_trait]
impl Renderer for NullRenderer {
    async fn open_page(&self) -> Result<Box<dyn Page>, RenderError> {
        if self.fail_open {
            return Err(RenderError::Session("browser unavailable".to_string()));
        }
        Ok(Box::new(NullPage))
    }
}

/// Retriever whose outcomes come from a closure
///
/// The closure receives the path, the strategy, and the 1-based number of
/// times that strategy has been called for that path.
pub struct ScriptedRetriever {
    script: Box<Script>,
    calls: Mutex<Vec<(String, Strategy)>>,
    counts: Mutex<HashMap<(String, Strategy), u32>>,
}

impl ScriptedRetriever {
    pub fn new(
        script: impl Fn(&str, Strategy, u32) -> Result<Retrieval, ItemError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Strategy)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    fn url_for(&self, strategy: Strategy, path: &str) -> String {
        format!("{}:{}", strategy, path)
    }

    fn strategy_of(&self, url: &str) -> Strategy {
        if url.starts_with("rendered:") {
            Strategy::Rendered
        } else {
            Strategy::Direct
        }
    }

    async fn retrieve(
        &self,
        _page: &mut dyn Page,
        strategy: Strategy,
        path: &str,
    ) -> Result<Retrieval, ItemError> {
        self.calls.lock().unwrap().push((path.to_string(), strategy));
        let call = {
            let mut counts = self.counts.lock().unwrap();
            let count = counts.entry((path.to_string(), strategy)).or_insert(0);
            *count += 1;
            *count
        };
        tokio::task::yield_now().await;
        (self.script)(path, strategy, call)
    }
}

/// Markdown body of exactly `len` non-whitespace characters
pub fn content(len: usize) -> String {
    (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect()
}

pub fn fetched(path: &str, strategy: Strategy, len: usize) -> FetchResult {
    FetchResult {
        title: "Test Page".to_string(),
        markdown: content(len),
        source_url: format!("{}:{}", strategy, path),
        path: path.to_string(),
        strategy,
    }
}

/// Settings with zero delays; lenient settings prefer the prior URL
pub fn create_test_settings(mode: QualityMode) -> PipelineSettings {
    let (priority, max_retries) = match mode {
        QualityMode::Strict => (StrategyPriority::DirectFirst, 2),
        QualityMode::Lenient => (StrategyPriority::PriorUrlFirst, 3),
    };

    PipelineSettings {
        mode,
        priority,
        concurrency: 4,
        item_delay: Duration::ZERO,
        retry: RetryPolicy {
            max_retries,
            timeout_max_retries: 6,
            ordinary_delay: Duration::ZERO,
            timeout_backoff_base: Duration::ZERO,
        },
        fetch: FetchTimings {
            navigation_timeout: Duration::from_secs(1),
            direct_settle: Duration::ZERO,
            render_settle: Duration::ZERO,
            selector_timeout: Duration::ZERO,
            content_selector: "main".to_string(),
        },
        quality: QualityThresholds {
            extract_min: 10,
            save_min: 100,
            floor: 10,
        },
    }
}
