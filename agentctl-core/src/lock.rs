//! Advisory file locks serializing window and mirror mutations.
//!
//! Locks live under `<state>/locks/` and are held for the lifetime of the
//! returned [`LockGuard`]; the kernel releases them if the process dies.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::error::{io_err, WorkspaceError};
use crate::types::{AgentName, RepoName};

/// Exclusive `flock` held until drop.
#[derive(Debug)]
pub struct LockGuard {
    _lock: Flock<File>,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock serializing window-mutating operations for one agent.
pub fn lock_agent(locks_dir: &Path, name: &AgentName) -> Result<LockGuard, WorkspaceError> {
    acquire(&locks_dir.join(format!("agent-{name}.lock")))
}

/// Locks for several agents, taken in sorted order so two renames can't
/// deadlock each other.
pub fn lock_agents(
    locks_dir: &Path,
    names: &[&AgentName],
) -> Result<Vec<LockGuard>, WorkspaceError> {
    let mut sorted: Vec<&AgentName> = names.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted.into_iter().map(|n| lock_agent(locks_dir, n)).collect()
}

/// Lock serializing clone/fetch/worktree-add against one mirror.
pub fn lock_mirror(locks_dir: &Path, repo: &RepoName) -> Result<LockGuard, WorkspaceError> {
    acquire(&locks_dir.join(format!("mirror-{repo}.lock")))
}

fn acquire(path: &Path) -> Result<LockGuard, WorkspaceError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    tracing::trace!(path = %path.display(), "waiting for lock");
    let lock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
        WorkspaceError::Lock {
            path: path.to_path_buf(),
            source: errno,
        }
    })?;
    Ok(LockGuard {
        _lock: lock,
        path: path.to_path_buf(),
    })
}
