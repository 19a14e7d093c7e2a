//! URL handling module for doc-harvest
//!
//! This module builds the two retrieval URLs for a site path, turns discovered
//! hrefs into site paths, and derives output file locations.

mod normalize;
mod paths;

use crate::config::SiteConfig;
use crate::UrlError;
use url::Url;

pub use normalize::{site_path_from_href, strip_mount_prefix};
pub use paths::{output_relative_path, title_from_path};

/// Resolved URL layout of the documentation site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    start_url: Url,
    base_url: String,
    dynamic_base_url: String,
    mount_prefix: String,
    target_prefix: String,
}

impl SiteUrls {
    /// Builds the site layout from the `[site]` configuration section
    ///
    /// The mount prefix is the path component of `base-url` (for example
    /// `/documents`), which discovered hrefs carry but site paths do not.
    pub fn from_config(site: &SiteConfig) -> Result<Self, UrlError> {
        let start_url = Url::parse(&site.start_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let base = Url::parse(&site.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        Ok(Self {
            start_url,
            base_url: site.base_url.trim_end_matches('/').to_string(),
            dynamic_base_url: site.dynamic_base_url.clone(),
            mount_prefix: base.path().trim_end_matches('/').to_string(),
            target_prefix: site.target_prefix.clone(),
        })
    }

    /// URL fetched by the direct strategy: `base-url + path`
    pub fn direct_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL fetched by the rendered strategy: `dynamic-base-url + urlencode(path)`
    pub fn dynamic_url(&self, path: &str) -> String {
        format!("{}{}", self.dynamic_base_url, urlencoding::encode(path))
    }

    /// Returns true if `url` was produced by [`SiteUrls::dynamic_url`]
    pub fn is_dynamic_url(&self, url: &str) -> bool {
        url.starts_with(&self.dynamic_base_url)
    }

    /// Returns true if a site path falls inside the harvested section
    pub fn is_target(&self, path: &str) -> bool {
        path.starts_with(&self.target_prefix)
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }
}
