use crate::{article_page, create_test_config, empty_shell};
use chrono::{TimeZone, Utc};
use doc_harvest::crawler::{Coordinator, HttpRenderer, SeedSource};
use doc_harvest::output::RunKind;
use doc_harvest::state::FailureKind;
use doc_harvest::storage::{load_ledger, save_ledger, FailureRecord, LedgerFile, LedgerPaths};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_record(server_uri: &str, site_path: &str) -> FailureRecord {
    FailureRecord {
        path: site_path.to_string(),
        last_used_url: format!(
            "{}/documents/dynamic.html?link={}",
            server_uri,
            urlencoding::encode(site_path)
        ),
        error_message: format!("No content extracted for {}", site_path),
        error_kind: FailureKind::Ordinary,
        retry_count: 2,
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        prior_error: None,
    }
}

/// Writes a fresh-run ledger into `dir` and returns its path
fn write_input_ledger(dir: &Path, records: Vec<FailureRecord>) -> PathBuf {
    let paths = LedgerPaths::fresh(dir);
    let ledger = LedgerFile::new(records, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    save_ledger(&paths, &ledger).unwrap();
    paths.json
}

fn create_test_coordinator(server: &MockServer, workdir: &TempDir) -> Coordinator {
    let config = create_test_config(&server.uri(), workdir.path());
    let renderer = HttpRenderer::new("doc-harvest-test/1.0").unwrap();
    Coordinator::new(config, Arc::new(renderer))
}

fn retry_ledgers(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("failed_links_retry_") && n.ends_with(".json"))
        })
        .collect()
}

#[tokio::test]
async fn test_resume_rescues_recovered_items() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/documents/dynamic.html"))
        .and(query_param("link", "/guide/missing.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Missing")))
        .mount(&server)
        .await;

    let input = write_input_ledger(
        workdir.path(),
        vec![create_test_record(&server.uri(), "/guide/missing.html")],
    );
    let original = std::fs::read_to_string(&input).unwrap();

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Ledger(input.clone()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.kind, RunKind::Resume);
    assert_eq!(outcome.stats.total, 1);
    // The recorded URL was the rendered one, so the rendered strategy goes first
    assert_eq!(outcome.stats.rendered_successes, 1);
    assert_eq!(outcome.stats.attempts, 1);
    assert!(outcome.ledger_paths.is_none());
    assert!(retry_ledgers(workdir.path()).is_empty());

    let document =
        std::fs::read_to_string(workdir.path().join("docs/guide/missing.md")).unwrap();
    assert!(document.contains("> Status: recovered on retry"));
    assert!(!document.contains("**Warning**"));

    assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
}

#[tokio::test]
async fn test_resume_saves_short_content_with_warning() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/documents/dynamic.html"))
        .and(query_param("link", "/guide/brief.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Brief</title></head><body>
<article><p>Short note about setup, nothing more.</p></article>
</body></html>"#,
        ))
        .mount(&server)
        .await;

    let input = write_input_ledger(
        workdir.path(),
        vec![create_test_record(&server.uri(), "/guide/brief.html")],
    );

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Ledger(input), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.successes(), 1);
    assert_eq!(outcome.stats.suspicious_saves, 1);
    assert!(outcome.failures.is_empty());

    let document = std::fs::read_to_string(workdir.path().join("docs/guide/brief.md")).unwrap();
    assert!(document.contains("**Warning**: content is short"));
    assert!(document.contains("Short note about setup"));
}

#[tokio::test]
async fn test_resume_of_unrecoverable_items_is_idempotent() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/documents/dynamic.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_shell()))
        .mount(&server)
        .await;

    let records = vec![
        create_test_record(&server.uri(), "/guide/a.html"),
        create_test_record(&server.uri(), "/guide/b.html"),
    ];
    let input = write_input_ledger(workdir.path(), records);
    let original = std::fs::read_to_string(&input).unwrap();

    let coordinator = create_test_coordinator(&server, &workdir);
    let outcome = coordinator
        .run(SeedSource::Ledger(input.clone()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 2);
    assert_eq!(outcome.stats.failures(), 2);
    assert_eq!(outcome.stats.successes(), 0);

    let paths = outcome.ledger_paths.unwrap();
    assert_eq!(retry_ledgers(workdir.path()), vec![paths.json.clone()]);
    assert!(paths
        .report
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("failed_links_retry_report_")));

    let written = load_ledger(&paths.json).unwrap();
    let input_paths: HashSet<_> = load_ledger(&input)
        .unwrap()
        .failed_links
        .into_iter()
        .map(|r| r.path)
        .collect();
    let output_paths: HashSet<_> = written.failed_links.iter().map(|r| r.path.clone()).collect();
    assert_eq!(input_paths, output_paths);

    for record in &written.failed_links {
        assert_eq!(record.retry_count, 1);
        assert_eq!(
            record.prior_error.as_deref(),
            Some(format!("No content extracted for {}", record.path).as_str())
        );
    }

    // The input ledger is never rewritten
    assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
}
