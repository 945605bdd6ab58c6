//! Context Materializer.
//!
//! The bundle is the global context document and the agent's overlay joined
//! under a generated-file header. The same bytes go to every name in
//! [`CONTEXT_FILENAMES`] at the worktree root, each replaced atomically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use agentctl_core::layout::CONTEXT_FILENAMES;
use agentctl_core::{AgentName, Layout};
use agentctl_renderer::{BundleContext, Renderer};

use crate::diff::{diff_file, FileDiff};
use crate::error::{io_err, SyncError};
use crate::writer::{atomic_write, WriteResult};

pub struct Materializer<'a> {
    layout: &'a Layout,
    renderer: &'a Renderer,
}

impl<'a> Materializer<'a> {
    pub fn new(layout: &'a Layout, renderer: &'a Renderer) -> Self {
        Self { layout, renderer }
    }

    /// Render the bundle for `agent`. Fails with
    /// [`SyncError::MissingSource`] when either document is absent.
    pub fn bundle(&self, agent: &AgentName) -> Result<String, SyncError> {
        let paths = self.layout.registry().paths(agent);
        let global = read_source("global context document", &self.layout.global_context)?;
        let overlay = read_source("agent overlay", &paths.overlay)?;
        let ctx = BundleContext::new(&paths, &self.layout.global_context, global, overlay);
        Ok(self.renderer.bundle(&ctx)?)
    }

    /// Regenerate every context file at `worktree_root`.
    pub fn write(
        &self,
        agent: &AgentName,
        worktree_root: &Path,
    ) -> Result<Vec<WriteResult>, SyncError> {
        require_dir(worktree_root)?;
        let content = self.bundle(agent)?;
        let results = targets(worktree_root)
            .iter()
            .map(|path| atomic_write(path, &content, false))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            agent = %agent,
            root = %worktree_root.display(),
            written = results.iter().filter(|r| r.is_change()).count(),
            "materialized context"
        );
        Ok(results)
    }

    /// What [`Materializer::write`] would change, as unified diffs.
    pub fn preview(&self, agent: &AgentName, worktree_root: &Path) -> Result<Vec<FileDiff>, SyncError> {
        require_dir(worktree_root)?;
        let content = self.bundle(agent)?;
        let mut diffs = Vec::new();
        for path in targets(worktree_root) {
            if let Some(diff) = diff_file(worktree_root, &path, &content)? {
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }
}

/// Generated file paths at `worktree_root`.
pub fn targets(worktree_root: &Path) -> Vec<PathBuf> {
    CONTEXT_FILENAMES.iter().map(|name| worktree_root.join(name)).collect()
}

fn require_dir(path: &Path) -> Result<(), SyncError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SyncError::MissingSource {
            what: "worktree",
            path: path.to_path_buf(),
        })
    }
}

fn read_source(what: &'static str, path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SyncError::MissingSource {
            what,
            path: path.to_path_buf(),
        }),
        Err(e) => Err(io_err(path, e)),
    }
}
