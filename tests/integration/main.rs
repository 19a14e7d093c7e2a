//! Integration tests for the harvest pipelines
//!
//! These tests use wiremock to stand in for the documentation site and run
//! the fresh and resume pipelines end-to-end against it.

mod harvest_tests;
mod resume_tests;

use doc_harvest::config::{parse_config, Config};
use std::path::Path;

const PARAGRAPH: &str = "The harvester walks every page of the documentation section, \
    converts the main article of each page into Markdown, and writes a ledger entry for \
    every page it could not fetch, so that a later pass can try again with more patience.";

/// Builds a configuration pointing at the mock server with all delays disabled
pub fn create_test_config(server_uri: &str, workdir: &Path) -> Config {
    let content = format!(
        r#"
[site]
start-url = "{uri}/documents/guide/index.html"
target-prefix = "/guide"
base-url = "{uri}/documents"
dynamic-base-url = "{uri}/documents/dynamic.html?link="

[fetch]
timeout-ms = 5000
direct-settle-ms = 0
render-settle-ms = 0
selector-timeout-ms = 0
discovery-settle-ms = 0

[pipeline]
concurrency = 3
delay-between-items-ms = 0
max-retries = 2
ordinary-retry-delay-ms = 0
timeout-backoff-base-ms = 0

[output]
output-dir = "{docs}"
ledger-dir = "{ledgers}"

[resume]
concurrency = 2
delay-between-items-ms = 0
timeout-ms = 5000
max-retries = 1
ordinary-retry-delay-ms = 0
timeout-backoff-base-ms = 0
direct-settle-ms = 0
render-settle-ms = 0
selector-timeout-ms = 0
"#,
        uri = server_uri,
        docs = workdir.join("docs").display(),
        ledgers = workdir.display(),
    );

    parse_config(&content).expect("test config should be valid")
}

/// A page whose article comfortably passes every quality threshold
pub fn article_page(title: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
<nav><a href="/documents/guide/index.html">Home</a></nav>
<article><h1>{title}</h1><p>{p}</p><p>{p}</p><p>{p}</p></article>
<div class="footer">Footer text</div>
</body></html>"#,
        title = title,
        p = PARAGRAPH
    )
}

/// The shell the rendered entry point serves before any content arrives
pub fn empty_shell() -> String {
    r#"<html><head><title>Docs</title></head><body><div id="app"></div></body></html>"#
        .to_string()
}
