//! Atomic, digest-gated file writer.
//!
//! ## `atomic_write` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 the content and the current on-disk bytes.
//! 3. Equal digests → `Unchanged`, nothing touched.
//! 4. Write to `<path>.agentctl.tmp`, created with the requested mode so
//!    key material is never readable by others, even briefly.
//! 5. Rename over the final path (atomic on POSIX).
//!
//! A crash between 4 and 5 leaves only the `.tmp` sibling behind; readers of
//! the target never observe a partial file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped: on-disk content already matches.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    /// `true` unless the file was left as it was because it already matched.
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically replace `path` with `content`.
pub fn atomic_write(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, SyncError> {
    atomic_write_mode(path, content, None, dry_run)
}

/// [`atomic_write`] with an explicit Unix permission mode for the result
/// (used for private key material).
pub fn atomic_write_mode(
    path: &Path,
    content: &str,
    mode: Option<u32>,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let content = content.replace("\r\n", "\n");
    if on_disk_digest(path)?.as_deref() == Some(digest(content.as_bytes()).as_str()) {
        if let (Some(mode), false) = (mode, dry_run) {
            set_mode(path, mode)?;
        }
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }
    if dry_run {
        tracing::info!(path = %path.display(), "[dry-run] would write");
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = tmp_path(path);
    let staged = stage(&tmp, &content, mode)
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| io_err(path, e)));
    if let Err(err) = staged {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }

    tracing::info!(path = %path.display(), "wrote");
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Write `content` to a fresh `tmp`. With a mode, the file is created with
/// it rather than widened umask defaults and narrowed afterwards.
fn stage(tmp: &Path, content: &str, mode: Option<u32>) -> Result<(), SyncError> {
    use std::io::Write;

    // A leftover from a crash keeps its old mode; start from nothing.
    match std::fs::remove_file(tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(tmp, e)),
    }
    let mut file = open_new(tmp, mode).map_err(|e| io_err(tmp, e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| io_err(tmp, e))?;
    // umask may have narrowed the creation mode further.
    mode.map_or(Ok(()), |m| set_mode(tmp, m))
}

#[cfg(unix)]
fn open_new(path: &Path, mode: Option<u32>) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create_new(true);
    if let Some(mode) = mode {
        opts.mode(mode);
    }
    opts.open(path)
}

#[cfg(not(unix))]
fn open_new(path: &Path, _mode: Option<u32>) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().write(true).create_new(true).open(path)
}

/// Staging sibling for `path`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".agentctl.tmp");
    path.with_file_name(name)
}

/// Hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

fn on_disk_digest(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(digest(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), SyncError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn new_context_file_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CLAUDE.md");
        let result = atomic_write(&path, "# bundle\n", false).unwrap();
        assert_eq!(result, WriteResult::Written { path: path.clone() });
        assert_eq!(fs::read_to_string(&path).unwrap(), "# bundle\n");
    }

    #[test]
    fn identical_bundle_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("AGENTS.md");
        atomic_write(&path, "# bundle\n", false).unwrap();
        let again = atomic_write(&path, "# bundle\n", false).unwrap();
        assert!(!again.is_change());
        assert_eq!(again.path(), path.as_path());
    }

    #[test]
    fn local_edits_are_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("GEMINI.md");
        atomic_write(&path, "# bundle\n", false).unwrap();
        fs::write(&path, "# bundle\nmy notes\n").unwrap();
        assert!(atomic_write(&path, "# bundle\n", false).unwrap().is_change());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# bundle\n");
    }

    #[test]
    fn dry_run_reports_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/CLAUDE.md");
        let result = atomic_write(&path, "x", true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn staging_file_sits_next_to_target_and_is_gone_afterwards() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CLAUDE.md");
        assert_eq!(tmp_path(&path), dir.path().join("CLAUDE.md.agentctl.tmp"));
        atomic_write(&path, "x", false).unwrap();
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn windows_line_endings_do_not_count_as_a_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CLAUDE.md");
        atomic_write(&path, "a\r\nb\r\n", false).unwrap();
        assert!(!atomic_write(&path, "a\nb\n", false).unwrap().is_change());
        assert_eq!(fs::read(&path).unwrap(), b"a\nb\n");
    }

    #[test]
    #[cfg(unix)]
    fn private_key_mode_is_enforced_even_when_unchanged() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agentctl_dev");
        atomic_write_mode(&path, "key\n", Some(0o600), false).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        let again = atomic_write_mode(&path, "key\n", Some(0o600), false).unwrap();
        assert!(!again.is_change());
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    #[cfg(unix)]
    fn staged_key_is_private_from_creation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let tmp = tmp_path(&dir.path().join("agentctl_dev"));
        // Stale world-readable leftover from an interrupted run.
        fs::write(&tmp, "old key\n").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        stage(&tmp, "new key\n", Some(0o600)).unwrap();
        assert_eq!(fs::metadata(&tmp).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&tmp).unwrap(), "new key\n");
    }

    #[test]
    fn directory_at_target_is_an_error_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CLAUDE.md");
        fs::create_dir_all(path.join("child")).unwrap();

        atomic_write(&path, "x", false).expect_err("a directory cannot be replaced");
        assert!(path.join("child").is_dir());
        assert!(!tmp_path(&path).exists());
    }
}
