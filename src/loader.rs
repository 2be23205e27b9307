//! Input discovery and reading.
//!
//! Expands command-line paths into export files and feeds them into the
//! session one by one, so an unreadable file never blocks the others.

use crate::session::Session;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extension of export files picked up from directories.
pub const EXPORT_EXTENSION: &str = "txt";

/// Exports larger than this are refused.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Expand files and directories into an ordered list of files.
///
/// Files are kept in the order given. Each directory is replaced by the
/// `.txt` files below it, sorted by path. Hidden entries are skipped.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", input.display(), e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_export(e.path()))
            .map(|e| e.into_path())
            .collect();

        found.sort();
        debug!("{}: {} export files", input.display(), found.len());

        if found.is_empty() {
            warn!("No .{} files in {}", EXPORT_EXTENSION, input.display());
        }
        files.extend(found);
    }

    files
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

fn is_export(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXPORT_EXTENSION))
}

/// Read one export file.
pub fn read_export(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if metadata.len() > MAX_FILE_SIZE {
        anyhow::bail!(
            "{} is too large ({} bytes, limit {})",
            path.display(),
            metadata.len(),
            MAX_FILE_SIZE
        );
    }

    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Display label for a file: its file name, or the full path when that
/// name is already taken by an earlier file.
fn label_for(path: &Path, taken: &[String]) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if taken.contains(&name) {
        path.display().to_string()
    } else {
        name
    }
}

/// Load every input into the session. Returns how many documents were added.
pub fn load_into_session(session: &mut Session, inputs: &[PathBuf]) -> usize {
    let mut added = 0;

    for path in expand_inputs(inputs) {
        let label = label_for(&path, &session.labels());

        let bytes = match read_export(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{:#}", e);
                session.record_failure(&label, format!("{:#}", e));
                continue;
            }
        };

        if session.add_upload(&label, &bytes).is_ok() {
            added += 1;
        }
    }

    added
}
