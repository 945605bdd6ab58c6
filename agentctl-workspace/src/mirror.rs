//! Repo Mirror Cache: one shared mirror clone per repo name.
//!
//! Mirrors live at `<mirrors>/<repo>.git` and are never copied per agent.
//! Upstream branches are tracked as `origin/*`, so refreshing a mirror
//! leaves the local branches of every agent's worktree in place.
//! Clone and fetch hold the per-mirror advisory lock.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use agentctl_core::error::io_err;
use agentctl_core::lock::lock_mirror;
use agentctl_core::{Layout, RepoMap, RepoName, SourceControl, WorkspaceError};

/// A mirror found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorInfo {
    pub repo: String,
    pub path: PathBuf,
    /// mtime of `FETCH_HEAD`, or of the mirror directory when never fetched.
    pub last_fetched: Option<DateTime<Utc>>,
}

pub struct RepoMirrorCache<'a> {
    layout: &'a Layout,
    scm: &'a dyn SourceControl,
}

impl<'a> RepoMirrorCache<'a> {
    pub fn new(layout: &'a Layout, scm: &'a dyn SourceControl) -> Self {
        Self { layout, scm }
    }

    pub fn mirror_path(&self, repo: &RepoName) -> PathBuf {
        self.layout.mirror_path(repo)
    }

    /// Clone URL for `repo` from the repo mapping document.
    pub fn resolve_url(&self, repo: &RepoName) -> Result<String, WorkspaceError> {
        let map = RepoMap::load(&self.layout.repos_file)?;
        map.resolve(repo).map(str::to_string)
    }

    /// Clone the mirror if absent, otherwise prune + fetch it. Returns the
    /// mirror path. The URL is only needed when cloning.
    pub fn ensure_fresh(&self, repo: &RepoName) -> Result<PathBuf, WorkspaceError> {
        let path = self.mirror_path(repo);
        let _lock = lock_mirror(&self.layout.locks_dir(), repo)?;
        if path.exists() {
            tracing::info!(repo = %repo, path = %path.display(), "fetching mirror");
            self.scm.fetch(&path)?;
        } else {
            let url = self.resolve_url(repo)?;
            std::fs::create_dir_all(&self.layout.mirrors_dir)
                .map_err(|e| io_err(&self.layout.mirrors_dir, e))?;
            tracing::info!(repo = %repo, url = %url, path = %path.display(), "cloning mirror");
            if let Err(err) = self.scm.clone_mirror(&url, &path) {
                // A half-made mirror would be fetched instead of cloned next time.
                if path.exists() {
                    if let Err(e) = std::fs::remove_dir_all(&path) {
                        tracing::warn!(path = %path.display(), error = %e, "cannot remove partial mirror");
                    }
                }
                return Err(err);
            }
        }
        Ok(path)
    }

    /// Drop stale worktree records in every mirror. Best-effort: returns
    /// the number of mirrors pruned; failures are logged and skipped.
    pub fn prune_all_worktrees(&self) -> usize {
        let mirrors = match self.list() {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, "cannot list mirrors for prune");
                return 0;
            }
        };
        let mut pruned = 0;
        for mirror in mirrors {
            match self.scm.prune_worktrees(&mirror.path) {
                Ok(()) => pruned += 1,
                Err(err) => {
                    tracing::warn!(repo = %mirror.repo, error = %err, "worktree prune failed");
                }
            }
        }
        pruned
    }

    /// Mirrors on disk (`*.git` directories), sorted by repo name.
    pub fn list(&self) -> Result<Vec<MirrorInfo>, WorkspaceError> {
        let dir = &self.layout.mirrors_dir;
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
        let mut mirrors: Vec<MirrorInfo> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| {
                let file_name = e.file_name().to_string_lossy().into_owned();
                let repo = file_name.strip_suffix(".git")?.to_string();
                let path = e.path();
                Some(MirrorInfo {
                    last_fetched: last_fetched(&path),
                    repo,
                    path,
                })
            })
            .collect();
        mirrors.sort_by(|a, b| a.repo.cmp(&b.repo));
        Ok(mirrors)
    }
}

fn last_fetched(mirror: &Path) -> Option<DateTime<Utc>> {
    let modified = |p: &Path| -> Option<SystemTime> { std::fs::metadata(p).ok()?.modified().ok() };
    modified(&mirror.join("FETCH_HEAD"))
        .or_else(|| modified(mirror))
        .map(DateTime::<Utc>::from)
}
