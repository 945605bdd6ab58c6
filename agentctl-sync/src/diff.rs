//! Unified diffs for `refresh-context --dry-run`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::{io_err, SyncError};

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare `rendered` to the current content of `path`. `None` when they
/// already match. Headers are relative to `root`.
pub fn diff_file(root: &Path, path: &Path, rendered: &str) -> Result<Option<FileDiff>, SyncError> {
    let rendered = normalize_line_endings(rendered);
    let existing = read_existing_or_empty(path)?;
    if existing == rendered {
        return Ok(None);
    }

    let relative = path.strip_prefix(root).unwrap_or(path);
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(FileDiff {
        path: path.to_path_buf(),
        unified_diff: unified,
    }))
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
