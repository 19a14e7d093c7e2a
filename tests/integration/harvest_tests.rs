use crate::{article_page, create_test_config, empty_shell};
use doc_harvest::crawler::{Coordinator, HttpRenderer, SeedSource};
use doc_harvest::output::RunKind;
use doc_harvest::state::FailureKind;
use doc_harvest::storage::load_ledger;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START_PAGE: &str = r#"<html><head><title>Guide</title></head><body>
<nav>
  <a href="/documents/guide/intro.html">Intro</a>
  <a href="setup.html">Setup</a>
  <a href="/documents/guide/missing.html">Missing</a>
  <a href="/documents/guide/intro.html#overview">Intro again</a>
  <a href="/documents/api/client.html">API reference</a>
  <a href="https://elsewhere.example.org/documents/guide/intro.html">Mirror</a>
</nav>
</body></html>"#;

fn create_test_coordinator(server: &MockServer, workdir: &TempDir) -> Coordinator {
    let config = create_test_config(&server.uri(), workdir.path());
    let renderer = HttpRenderer::new("doc-harvest-test/1.0").unwrap();
    Coordinator::new(config, Arc::new(renderer))
}

async fn mount_start_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/documents/guide/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(START_PAGE))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_harvest_end_to_end() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    mount_start_page(&server).await;

    // Served directly
    Mock::given(method("GET"))
        .and(path("/documents/guide/intro.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Intro")))
        .mount(&server)
        .await;

    // Only available through the rendered entry point
    Mock::given(method("GET"))
        .and(path("/documents/dynamic.html"))
        .and(query_param("link", "/guide/setup.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Setup")))
        .mount(&server)
        .await;

    // Never has content
    Mock::given(method("GET"))
        .and(path("/documents/dynamic.html"))
        .and(query_param("link", "/guide/missing.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_shell()))
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Discover, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.kind, RunKind::Fresh);
    assert!(!outcome.interrupted);

    // Three unique target links; the API page and the mirror are filtered out
    let stats = &outcome.stats;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.direct_successes, 1);
    assert_eq!(stats.rendered_successes, 1);
    assert_eq!(stats.failures(), 1);
    assert_eq!(stats.completed(), stats.total);

    let intro = std::fs::read_to_string(workdir.path().join("docs/guide/intro.md")).unwrap();
    assert!(intro.starts_with("# Intro\n"));
    assert!(intro.contains(&format!(
        "> Original URL: {}/documents/guide/intro.html",
        server.uri()
    )));
    assert!(intro.contains("> Source path: /guide/intro.html"));
    assert!(intro.contains("documentation section"));
    assert!(!intro.contains("> Status:"));

    let setup = std::fs::read_to_string(workdir.path().join("docs/guide/setup.md")).unwrap();
    assert!(setup.contains("dynamic.html?link="));

    assert!(!workdir.path().join("docs/guide/missing.md").exists());

    let paths = outcome.ledger_paths.unwrap();
    assert_eq!(paths.json, workdir.path().join("failed_links.json"));
    assert!(paths.report.exists());

    let ledger = load_ledger(&paths.json).unwrap();
    assert_eq!(ledger.total_failed, 1);
    let record = &ledger.failed_links[0];
    assert_eq!(record.path, "/guide/missing.html");
    assert_eq!(record.error_kind, FailureKind::Ordinary);
    assert_eq!(record.retry_count, 2);
    assert!(record.error_message.contains("Page not found"));
    assert!(record.prior_error.is_none());
}

#[tokio::test]
async fn test_fresh_harvest_without_failures_writes_no_ledger() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/documents/guide/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="intro.html">Intro</a></body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/guide/intro.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Intro")))
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Discover, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 1);
    assert_eq!(outcome.stats.successes(), 1);
    assert!(outcome.ledger_paths.is_none());
    assert!(!workdir.path().join("failed_links.json").exists());
}

#[tokio::test]
async fn test_start_page_without_targets_runs_nothing() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/documents/guide/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a href="/documents/api/x.html">API</a></body></html>"#,
        ))
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Discover, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 0);
    assert_eq!(outcome.stats.completed(), 0);
    assert!(outcome.failures.is_empty());
}
