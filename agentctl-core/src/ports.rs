//! Capability ports: the narrow interfaces the orchestrator drives.
//!
//! The real adapters shell out to `tmux`, `git` and `aws`; tests use the
//! in-memory fakes from `agentctl-workspace`. All methods are synchronous:
//! every invocation of the CLI handles one request to completion.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::WorkspaceError;

// ── Multiplexer ──────────────────────────────────────────────────────────────

/// Stable multiplexer window handle (tmux `#{window_id}`, e.g. `@3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowId(pub String);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A window as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub index: u32,
    pub name: String,
    pub active: bool,
    /// Recorded default path (`@agentctl_path`), when set.
    pub default_path: Option<PathBuf>,
}

/// Session and window control for a terminal multiplexer.
pub trait Multiplexer {
    fn has_session(&self, session: &str) -> Result<bool, WorkspaceError>;
    /// Create a detached session whose first window is `first_window`, running
    /// `shell` as a login shell. No working directory is pinned.
    fn new_session(&self, session: &str, first_window: &str, shell: &str)
        -> Result<(), WorkspaceError>;
    /// Session-wide default shell and key bindings that open new panes in the
    /// window's recorded default path.
    fn configure_session(&self, session: &str, shell: &str) -> Result<(), WorkspaceError>;
    fn set_environment(&self, session: &str, key: &str, value: &str)
        -> Result<(), WorkspaceError>;
    /// Windows of `session`; empty when the session is not running.
    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, WorkspaceError>;
    fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
        shell: &str,
    ) -> Result<WindowId, WorkspaceError>;
    fn select_window(&self, session: &str, window: &WindowId) -> Result<(), WorkspaceError>;
    /// Rename and pin the name (automatic renaming off).
    fn rename_window(&self, session: &str, window: &WindowId, name: &str)
        -> Result<(), WorkspaceError>;
    fn set_default_path(&self, session: &str, window: &WindowId, path: &Path)
        -> Result<(), WorkspaceError>;
    fn kill_window(&self, session: &str, window: &WindowId) -> Result<(), WorkspaceError>;
    /// Type `line` into the window's active pane, followed by Enter.
    fn send_line(&self, session: &str, window: &WindowId, line: &str)
        -> Result<(), WorkspaceError>;
    /// Attach interactively (or switch client when already inside).
    fn attach(&self, session: &str, window: Option<&WindowId>) -> Result<(), WorkspaceError>;
}

// ── Source control ───────────────────────────────────────────────────────────

/// Mirror and worktree operations against a bare mirror clone.
///
/// Upstream branches live under `origin/*` inside the mirror; local branches
/// belong to agent worktrees and are never touched by a fetch.
pub trait SourceControl {
    /// Bare clone of `url` into `dest` with every upstream branch fetched
    /// as `origin/<branch>`.
    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<(), WorkspaceError>;
    /// Fetch from `origin`, pruning remote-tracking refs gone upstream.
    fn fetch(&self, mirror: &Path) -> Result<(), WorkspaceError>;
    /// `true` when `refname` resolves to a commit inside `mirror`.
    fn ref_exists(&self, mirror: &Path, refname: &str) -> Result<bool, WorkspaceError>;
    /// Create or force-reset `branch` at `base` and check it out at `path`.
    fn add_worktree(
        &self,
        mirror: &Path,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<(), WorkspaceError>;
    /// Drop administrative records of worktrees whose directories are gone.
    fn prune_worktrees(&self, mirror: &Path) -> Result<(), WorkspaceError>;
    /// Re-link moved worktrees to `mirror`.
    fn repair_worktrees(&self, mirror: &Path, paths: &[PathBuf]) -> Result<(), WorkspaceError>;
    /// Checked-out branch of `worktree`, `None` when detached.
    fn current_branch(&self, worktree: &Path) -> Result<Option<String>, WorkspaceError>;
}

// ── Secret store ─────────────────────────────────────────────────────────────

/// Remote secret / parameter store holding shared configuration.
pub trait SecretStore {
    fn secret(&self, id: &str, region: &str) -> Result<String, WorkspaceError>;
    fn parameter(&self, name: &str, region: &str) -> Result<String, WorkspaceError>;
}
