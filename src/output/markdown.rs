//! Markdown document generation
//!
//! Every saved page becomes one Markdown file under the output root, at a
//! location derived from its site path. The file starts with the title and a
//! block of metadata lines, followed by the converted body.

use crate::crawler::FetchResult;
use crate::storage::write_atomic;
use crate::url::output_relative_path;
use chrono::{DateTime, Local, Utc};
use std::io;
use std::path::PathBuf;

/// Optional annotation lines added to a document's metadata block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentNotes {
    /// Processing status, set on documents produced by a resume run
    pub status: Option<String>,

    /// Warning for content that passed only the lenient quality gate
    pub suspicious: Option<String>,
}

impl DocumentNotes {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.suspicious.is_none()
    }
}

/// Formats a document from a fetch result
///
/// # Arguments
///
/// * `result` - The converted page
/// * `generated_at` - Timestamp written into the metadata block
/// * `notes` - Optional status and annotation lines
///
/// # Returns
///
/// The full file content
pub fn render_document(
    result: &FetchResult,
    generated_at: DateTime<Utc>,
    notes: &DocumentNotes,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", result.title));
    md.push_str(&format!("> Original URL: {}\n", result.source_url));
    md.push_str(&format!("> Source path: {}\n", result.path));
    md.push_str(&format!(
        "> Generated: {}\n",
        generated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %:z")
    ));
    if let Some(status) = &notes.status {
        md.push_str(&format!("> Status: {}\n", status));
    }
    if let Some(warning) = &notes.suspicious {
        md.push_str(&format!(">\n> **Warning**: {}\n", warning));
    }

    md.push('\n');
    md.push_str(result.markdown.trim());
    md.push('\n');
    md
}

/// Writes documents below an output root
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    root: PathBuf,
}

impl DocumentWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File location for a site path
    pub fn path_for(&self, site_path: &str) -> PathBuf {
        self.root.join(output_relative_path(site_path))
    }

    /// Renders and atomically writes the document for `result`
    ///
    /// The write and its fsync run on the blocking pool so a slow disk never
    /// stalls the runtime threads driving other workers.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Location of the written file
    /// * `Err(io::Error)` - Directory creation or write failed
    pub async fn write(&self, result: &FetchResult, notes: &DocumentNotes) -> io::Result<PathBuf> {
        let target = self.path_for(&result.path);
        let content = render_document(result, Utc::now(), notes);

        let destination = target.clone();
        tokio::task::spawn_blocking(move || write_atomic(&destination, &content))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
        tracing::debug!(path = %result.path, file = %target.display(), "Document written");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Strategy;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_result() -> FetchResult {
        FetchResult {
            title: "Install Guide".to_string(),
            markdown: "\nRun the installer.\n\n".to_string(),
            source_url: "https://docs.example.com/documents/guide/install.html".to_string(),
            path: "/guide/install.html".to_string(),
            strategy: Strategy::Direct,
        }
    }

    #[test]
    fn test_render_document_template() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let doc = render_document(&create_test_result(), at, &DocumentNotes::default());

        assert!(doc.starts_with("# Install Guide\n\n"));
        assert!(doc.contains("> Original URL: https://docs.example.com/documents/guide/install.html\n"));
        assert!(doc.contains("> Source path: /guide/install.html\n"));
        assert!(doc.contains("> Generated: 2024-05-01"));
        assert!(!doc.contains("> Status:"));
        assert!(!doc.contains("**Warning**"));
        assert!(doc.ends_with("\n\nRun the installer.\n"));
    }

    #[test]
    fn test_render_document_with_notes() {
        let notes = DocumentNotes {
            status: Some("recovered on retry".to_string()),
            suspicious: Some("content is short (30 chars)".to_string()),
        };
        let doc = render_document(&create_test_result(), Utc::now(), &notes);

        assert!(doc.contains("> Status: recovered on retry\n"));
        assert!(doc.contains("> **Warning**: content is short (30 chars)\n"));
    }

    #[tokio::test]
    async fn test_writer_derives_location() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());

        let written = writer
            .write(&create_test_result(), &DocumentNotes::default())
            .await
            .unwrap();

        assert_eq!(written, dir.path().join("guide/install.md"));
        let content = std::fs::read_to_string(&written).unwrap();
        assert!(content.contains("Run the installer."));
    }

    #[tokio::test]
    async fn test_writer_keeps_query_variants_apart() {
        let dir = TempDir::new().unwrap();
        let writer = DocumentWriter::new(dir.path());

        let mut english = create_test_result();
        english.path = "/guide/install.html?lang=en".to_string();
        english.markdown = "English body".to_string();
        let mut chinese = create_test_result();
        chinese.path = "/guide/install.html?lang=zh".to_string();
        chinese.markdown = "Chinese body".to_string();

        let first = writer.write(&english, &DocumentNotes::default()).await.unwrap();
        let second = writer.write(&chinese, &DocumentNotes::default()).await.unwrap();

        assert_ne!(first, second);
        assert!(std::fs::read_to_string(&first).unwrap().contains("English body"));
        assert!(std::fs::read_to_string(&second).unwrap().contains("Chinese body"));
    }

    #[tokio::test]
    async fn test_writer_reports_unwritable_root() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("docs");
        std::fs::write(&blocker, "not a directory").unwrap();

        let writer = DocumentWriter::new(&blocker);
        let result = writer
            .write(&create_test_result(), &DocumentNotes::default())
            .await;

        assert!(result.is_err());
    }
}
