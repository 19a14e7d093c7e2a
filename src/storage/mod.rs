//! Storage module for persisting run results
//!
//! This module handles everything written to disk besides the harvested
//! documents themselves:
//! - The failure ledger (structured JSON) and its human-readable report
//! - Loading a ledger back as the seed of a resume run
//! - Atomic file replacement shared with the document writer

mod ledger;

pub use ledger::{
    load_ledger, render_report, save_ledger, FailureLedger, FailureRecord, LedgerError,
    LedgerFile, LedgerPaths,
};

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replaces `target` with `content`
///
/// The content is written to a temporary file in the target's directory,
/// synced, then renamed over the target. Parent directories are created as
/// needed. A crash mid-write leaves either the old file or the new one.
///
/// # Arguments
///
/// * `target` - Final file location
/// * `content` - Full file content
pub fn write_atomic(target: &Path, content: &str) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/c.md");

        write_atomic(&target, "hello").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("c.md");

        write_atomic(&target, "first").unwrap();
        write_atomic(&target, "second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        // Only the target remains; no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
