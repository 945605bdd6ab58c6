//! On-disk agent registry.
//!
//! An agent exists exactly when `<agents>/<name>/` exists. The registry owns
//! that directory tree (root, `work/`, `logs/`, overlay file) and nothing
//! else; windows and worktree bookkeeping are layered on top by the
//! orchestrator.
//!
//! # Idempotence
//!
//! [`AgentRegistry::ensure`] may be called any number of times: directories
//! are created with `create_dir_all` and the overlay document is only written
//! when absent (`create_new`), so an existing overlay is never touched.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{io_err, WorkspaceError};
use crate::layout::OVERLAY_FILE;
use crate::types::{AgentName, AgentPaths, RepoName};

/// Directory-backed registry of agents under a single base path.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents_dir: PathBuf,
}

impl AgentRegistry {
    pub fn new(agents_dir: impl Into<PathBuf>) -> Self {
        Self {
            agents_dir: agents_dir.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.agents_dir
    }

    // -----------------------------------------------------------------------
    // 1. Path helpers (pure)
    // -----------------------------------------------------------------------

    /// Resolve the paths for `name` without touching the filesystem.
    pub fn paths(&self, name: &AgentName) -> AgentPaths {
        let root = self.agents_dir.join(name.as_str());
        AgentPaths {
            name: name.clone(),
            work: root.join("work"),
            logs: root.join("logs"),
            overlay: root.join(OVERLAY_FILE),
            root,
        }
    }

    pub fn exists(&self, name: &AgentName) -> bool {
        self.agents_dir.join(name.as_str()).is_dir()
    }

    // -----------------------------------------------------------------------
    // 2. Ensure
    // -----------------------------------------------------------------------

    /// Create the agent's directories and, if absent, its overlay document
    /// with `default_overlay` as content. Returns the resolved paths.
    pub fn ensure(
        &self,
        name: &AgentName,
        default_overlay: &str,
    ) -> Result<AgentPaths, WorkspaceError> {
        let paths = self.paths(name);
        for dir in [&paths.root, &paths.work, &paths.logs] {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&paths.overlay)
        {
            Ok(mut file) => {
                file.write_all(default_overlay.as_bytes())
                    .map_err(|e| io_err(&paths.overlay, e))?;
                tracing::debug!(agent = %name, path = %paths.overlay.display(), "created overlay");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(io_err(&paths.overlay, e)),
        }

        Ok(paths)
    }

    // -----------------------------------------------------------------------
    // 3. List
    // -----------------------------------------------------------------------

    /// Immediate subdirectories of the base path, sorted. Empty when the base
    /// path does not exist. Entries that are not valid agent names (hidden
    /// directories, reserved names) are skipped.
    pub fn list(&self) -> Result<Vec<AgentName>, WorkspaceError> {
        if !self.agents_dir.exists() {
            return Ok(vec![]);
        }
        let entries =
            std::fs::read_dir(&self.agents_dir).map_err(|e| io_err(&self.agents_dir, e))?;
        let mut names: Vec<AgentName> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| {
                let raw = e.file_name().to_string_lossy().into_owned();
                match AgentName::parse(&raw) {
                    Ok(name) => Some(name),
                    Err(err) => {
                        tracing::debug!(entry = %raw, error = %err, "skipping non-agent directory");
                        None
                    }
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Worktrees of `name`: directories under `work/` holding a `.git`
    /// marker (file or directory), sorted by repo name.
    pub fn worktrees(&self, name: &AgentName) -> Result<Vec<(RepoName, PathBuf)>, WorkspaceError> {
        let work = self.paths(name).work;
        if !work.is_dir() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&work).map_err(|e| io_err(&work, e))?;
        let mut found: Vec<(RepoName, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|e| has_git_marker(&e.path()))
            .filter_map(|e| {
                let raw = e.file_name().to_string_lossy().into_owned();
                RepoName::parse(&raw).ok().map(|repo| (repo, e.path()))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    // -----------------------------------------------------------------------
    // 4. Rename / remove
    // -----------------------------------------------------------------------

    /// Move `<agents>/<old>` to `<agents>/<new>`.
    ///
    /// Fails with [`WorkspaceError::AgentExists`] before touching anything if
    /// `new` is already on disk, and with [`WorkspaceError::AgentNotFound`] if
    /// `old` is not.
    pub fn rename(&self, old: &AgentName, new: &AgentName) -> Result<AgentPaths, WorkspaceError> {
        let from = self.paths(old);
        let to = self.paths(new);
        if to.root.exists() {
            return Err(WorkspaceError::AgentExists {
                name: new.to_string(),
                path: to.root,
            });
        }
        if !from.root.is_dir() {
            return Err(WorkspaceError::AgentNotFound {
                name: old.to_string(),
            });
        }
        std::fs::rename(&from.root, &to.root).map_err(|e| io_err(&from.root, e))?;
        tracing::info!(from = %old, to = %new, "renamed agent directory");
        Ok(to)
    }

    /// Remove the agent's directory tree. Returns `false` if it did not exist.
    pub fn remove(&self, name: &AgentName) -> Result<bool, WorkspaceError> {
        let root = self.paths(name).root;
        if !root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&root).map_err(|e| io_err(&root, e))?;
        tracing::info!(agent = %name, "removed agent directory");
        Ok(true)
    }
}

/// `true` when `dir/.git` exists as a file (worktree pointer) or directory.
pub fn has_git_marker(dir: &Path) -> bool {
    std::fs::symlink_metadata(dir.join(".git")).is_ok()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
