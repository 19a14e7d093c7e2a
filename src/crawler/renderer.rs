//! Page rendering sessions
//!
//! The retrieval strategies talk to pages through the [`Page`] trait so a
//! browser-backed renderer can stand in for the HTTP one. Each worker opens a
//! single page from a [`Renderer`] and reuses it for every item it processes.
//!
//! [`HttpRenderer`] is the built-in implementation. It fetches the served HTML
//! with reqwest and does not execute scripts, so `WaitUntil` is satisfied as
//! soon as the response body has arrived.

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Load state a navigation waits for before returning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// Document is ready (DOMContentLoaded)
    Minimal,
    /// Network has been idle for a while
    Idle,
}

/// Errors raised by a page session
#[derive(Debug, Error)]
pub enum RenderError {
    /// Navigation did not complete within its timeout
    #[error("Timeout {}ms exceeded navigating to {url}", timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// Connection, TLS or body read failure
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The session could not be opened or is unusable
    #[error("Page session error: {0}")]
    Session(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// One long-lived page session, exclusively owned by a worker
#[async_trait]
pub trait Page: Send {
    /// Navigates to `url` and waits for `wait_until`, bounded by `timeout`
    async fn goto(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), RenderError>;

    /// Serialized HTML of the current document
    async fn html(&self) -> Result<String, RenderError>;

    /// Title of the current document, if it has one
    async fn title(&self) -> Result<Option<String>, RenderError>;

    /// HTTP status of the last navigation, when the session reports one
    fn status(&self) -> Option<u16>;

    /// Waits up to `timeout` for `selector` to match; returns whether it did
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, RenderError>;

    /// Releases the session
    async fn close(self: Box<Self>);
}

/// Factory for page sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn Page>, RenderError>;
}

/// Builds the HTTP client shared by all sessions of an [`HttpRenderer`]
///
/// # Arguments
///
/// * `user_agent` - User agent sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that serves pages straight from HTTP responses
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(user_agent: &str) -> Result<Self, RenderError> {
        let client = build_http_client(user_agent)
            .map_err(|e| RenderError::Session(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn open_page(&self) -> Result<Box<dyn Page>, RenderError> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            body: None,
            status: None,
        }))
    }
}

/// Page session backed by plain HTTP requests
#[derive(Debug)]
pub struct HttpPage {
    client: Client,
    body: Option<String>,
    status: Option<u16>,
}

impl HttpPage {
    fn current_body(&self) -> Result<&str, RenderError> {
        self.body
            .as_deref()
            .ok_or_else(|| RenderError::Session("no page has been loaded".to_string()))
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(
        &mut self,
        url: &str,
        _wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        self.body = None;
        self.status = None;

        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(timeout, request).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            Ok(Err(e)) if e.is_timeout() => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            Ok(Err(e)) => {
                return Err(RenderError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(loaded)) => loaded,
        };

        tracing::trace!(url = %url, status, bytes = body.len(), "Page loaded");
        self.status = Some(status);
        self.body = Some(body);
        Ok(())
    }

    async fn html(&self) -> Result<String, RenderError> {
        self.current_body().map(str::to_string)
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        Ok(document_title(self.current_body()?))
    }

    fn status(&self) -> Option<u16> {
        self.status
    }

    /// Static HTML never changes after load, so this is a single check
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, RenderError> {
        selector_matches(self.current_body()?, selector)
    }

    async fn close(self: Box<Self>) {}
}

fn selector_matches(html: &str, selector: &str) -> Result<bool, RenderError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| RenderError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
    let document = Html::parse_document(html);
    let found = document.select(&parsed).next().is_some();
    Ok(found)
}

/// Extracts the text of the `<title>` element
pub(crate) fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
