//! Refresh pipeline behind `agentctl refresh-context`.
//!
//! Walks every agent (or one), every worktree under its `work/` directory
//! (or one repo), and re-runs the [`Materializer`]. A worktree whose sources
//! are missing is skipped with a warning; any other failure aborts.

use std::path::PathBuf;

use agentctl_core::{AgentName, Layout, RepoName, WorkspaceError};
use agentctl_renderer::Renderer;

use crate::diff::FileDiff;
use crate::error::SyncError;
use crate::materialize::Materializer;

/// Which worktrees to refresh. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshFilter {
    pub agent: Option<AgentName>,
    pub repo: Option<RepoName>,
}

/// Summary of one refresh run.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Worktree roots materialized (or previewed) successfully.
    pub refreshed: Vec<PathBuf>,
    /// Files whose content actually changed.
    pub files_changed: usize,
    /// Worktrees skipped, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Populated in dry-run mode only.
    pub diffs: Vec<FileDiff>,
}

/// Run the pipeline. In `dry_run` mode nothing is written and `diffs`
/// collects what would change.
pub fn run(
    layout: &Layout,
    renderer: &Renderer,
    filter: &RefreshFilter,
    dry_run: bool,
) -> Result<RefreshReport, SyncError> {
    let registry = layout.registry();
    let agents = match &filter.agent {
        Some(agent) if !registry.exists(agent) => {
            return Err(WorkspaceError::AgentNotFound {
                name: agent.to_string(),
            }
            .into())
        }
        Some(agent) => vec![agent.clone()],
        None => registry.list()?,
    };

    let materializer = Materializer::new(layout, renderer);
    let mut report = RefreshReport::default();

    for agent in &agents {
        for (repo, root) in registry.worktrees(agent)? {
            if filter.repo.as_ref().is_some_and(|r| r != &repo) {
                continue;
            }
            let outcome = if dry_run {
                materializer.preview(agent, &root).map(|diffs| {
                    report.files_changed += diffs.len();
                    report.diffs.extend(diffs);
                })
            } else {
                materializer.write(agent, &root).map(|results| {
                    report.files_changed += results.iter().filter(|r| r.is_change()).count();
                })
            };
            match outcome {
                Ok(()) => report.refreshed.push(root),
                Err(err) if err.is_missing_source() => {
                    tracing::warn!(agent = %agent, repo = %repo, error = %err, "skipping context refresh");
                    report.skipped.push((root, err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
    }

    tracing::info!(
        refreshed = report.refreshed.len(),
        skipped = report.skipped.len(),
        dry_run,
        "context refresh finished"
    );
    Ok(report)
}
