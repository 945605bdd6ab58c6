//! Worktree Provisioner.
//!
//! Binds one agent, one repo and one branch to `<agent>/work/<repo>`,
//! checked out from the shared mirror.
//!
//! # Branch reset
//!
//! Creation uses force-create semantics: when `branch` already exists in the
//! mirror it is reset to the selected base ref, discarding whatever that
//! branch pointed at before. An existing worktree is never touched.
//!
//! # Base refs
//!
//! Upstream branches sit under `origin/*` in the mirror, so on a fresh
//! mirror the base is `origin/main` or `origin/master`. A bare `main` or
//! `master` only resolves once some agent has a local branch of that name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use agentctl_core::lock::lock_mirror;
use agentctl_core::registry::has_git_marker;
use agentctl_core::{AgentName, BranchName, Layout, RepoName, SourceControl, WorkspaceError};
use agentctl_renderer::Renderer;
use agentctl_sync::Materializer;

use crate::agents::ensure_agent;
use crate::error::OrchestratorError;
use crate::mirror::RepoMirrorCache;

/// Result of materializing context files after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContextStatus {
    Written { files: usize },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorktreeOutcome {
    Created {
        path: PathBuf,
        branch: String,
        base: String,
        context: ContextStatus,
    },
    /// A `.git` marker was already present; nothing was done.
    AlreadyExists { path: PathBuf },
}

impl WorktreeOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WorktreeOutcome::Created { path, .. } | WorktreeOutcome::AlreadyExists { path } => path,
        }
    }
}

pub struct Provisioner<'a> {
    layout: &'a Layout,
    scm: &'a dyn SourceControl,
    renderer: &'a Renderer,
}

impl<'a> Provisioner<'a> {
    pub fn new(layout: &'a Layout, scm: &'a dyn SourceControl, renderer: &'a Renderer) -> Self {
        Self {
            layout,
            scm,
            renderer,
        }
    }

    pub fn ensure(
        &self,
        agent: &AgentName,
        repo: &RepoName,
        branch: &BranchName,
    ) -> Result<WorktreeOutcome, OrchestratorError> {
        let paths = ensure_agent(self.layout, self.renderer, agent)?;
        let target = paths.worktree(repo);

        if has_git_marker(&target) {
            tracing::info!(agent = %agent, repo = %repo, path = %target.display(), "worktree already exists");
            return Ok(WorktreeOutcome::AlreadyExists { path: target });
        }

        let mirror = RepoMirrorCache::new(self.layout, self.scm).ensure_fresh(repo)?;
        let base = self.select_base(&mirror)?;

        {
            let _lock = lock_mirror(&self.layout.locks_dir(), repo)?;
            tracing::info!(
                agent = %agent,
                repo = %repo,
                branch = %branch,
                base = %base,
                "creating worktree"
            );
            self.scm
                .add_worktree(&mirror, &target, branch.as_str(), &base)?;
        }

        let context = match Materializer::new(self.layout, self.renderer).write(agent, &target) {
            Ok(results) => ContextStatus::Written {
                files: results.len(),
            },
            Err(err) => {
                tracing::warn!(agent = %agent, repo = %repo, error = %err, "context files not written");
                ContextStatus::Skipped {
                    reason: err.to_string(),
                }
            }
        };

        Ok(WorktreeOutcome::Created {
            path: target,
            branch: branch.to_string(),
            base,
            context,
        })
    }

    /// First configured base ref that resolves inside `mirror`.
    pub fn select_base(&self, mirror: &Path) -> Result<String, WorkspaceError> {
        for candidate in &self.layout.base_refs {
            if self.scm.ref_exists(mirror, candidate)? {
                tracing::debug!(base = %candidate, "selected base ref");
                return Ok(candidate.clone());
            }
        }
        Err(WorkspaceError::NoBaseRef {
            mirror: mirror.to_path_buf(),
            tried: self.layout.base_refs.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeSourceControl;
    use std::fs;
    use tempfile::TempDir;

    const URL: &str = "git@host:org/demo.git";

    fn layout(home: &Path) -> Layout {
        let layout = Layout::defaults_at(home);
        fs::create_dir_all(&layout.config_dir).unwrap();
        fs::write(&layout.repos_file, format!("demo {URL}\n")).unwrap();
        layout
    }

    fn names() -> (AgentName, RepoName) {
        (AgentName::parse("a1").unwrap(), RepoName::parse("demo").unwrap())
    }

    fn branch(raw: &str) -> BranchName {
        BranchName::parse(raw).unwrap()
    }

    #[test]
    fn prefers_main_over_fallback_regardless_of_creation_order() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["master", "main"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();

        let outcome = Provisioner::new(&layout, &scm, &renderer)
            .ensure(&agent, &repo, &branch("feature-x"))
            .unwrap();
        match outcome {
            WorktreeOutcome::Created { base, .. } => assert_eq!(base, "origin/main"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_master() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["develop", "master"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();

        let outcome = Provisioner::new(&layout, &scm, &renderer)
            .ensure(&agent, &repo, &branch("feature-x"))
            .unwrap();
        assert!(matches!(outcome, WorktreeOutcome::Created { ref base, .. } if base == "origin/master"));
    }

    #[test]
    fn second_agent_on_same_repo_keeps_first_agents_branch() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["main"]);
        let renderer = Renderer::new().unwrap();
        let (a1, repo) = names();
        let a2 = AgentName::parse("a2").unwrap();
        let p = Provisioner::new(&layout, &scm, &renderer);

        let first = p.ensure(&a1, &repo, &branch("feature-x")).unwrap();
        p.ensure(&a2, &repo, &branch("feature-y")).unwrap();

        let mirror = layout.mirror_path(&repo);
        assert!(scm.ref_exists(&mirror, "feature-x").unwrap());
        assert_eq!(scm.current_branch(first.path()).unwrap().as_deref(), Some("feature-x"));
    }

    #[test]
    fn no_base_ref_is_an_error_without_worktree() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["develop"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();

        let err = Provisioner::new(&layout, &scm, &renderer)
            .ensure(&agent, &repo, &branch("feature-x"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Workspace(WorkspaceError::NoBaseRef { .. })), "got: {err}");
        assert!(!layout.registry().paths(&agent).worktree(&repo).exists());
    }

    #[test]
    fn existing_worktree_is_never_clobbered() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["main"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();
        let p = Provisioner::new(&layout, &scm, &renderer);

        p.ensure(&agent, &repo, &branch("feature-x")).unwrap();
        let calls_before = scm.calls();
        let second = p.ensure(&agent, &repo, &branch("feature-y")).unwrap();

        assert!(matches!(second, WorktreeOutcome::AlreadyExists { .. }));
        assert_eq!(scm.calls(), calls_before, "no fetch or add on an existing worktree");
        assert_eq!(
            scm.current_branch(second.path()).unwrap().as_deref(),
            Some("feature-x")
        );
    }

    #[test]
    fn missing_context_sources_do_not_fail_creation() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        let scm = FakeSourceControl::new().with_remote(URL, &["main"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();

        let outcome = Provisioner::new(&layout, &scm, &renderer)
            .ensure(&agent, &repo, &branch("feature-x"))
            .unwrap();
        match outcome {
            WorktreeOutcome::Created { context, path, .. } => {
                assert!(matches!(context, ContextStatus::Skipped { .. }));
                assert!(!path.join("CLAUDE.md").exists());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn context_written_when_sources_exist() {
        let home = TempDir::new().unwrap();
        let layout = layout(home.path());
        fs::write(&layout.global_context, "# global\n").unwrap();
        let scm = FakeSourceControl::new().with_remote(URL, &["main"]);
        let renderer = Renderer::new().unwrap();
        let (agent, repo) = names();

        let outcome = Provisioner::new(&layout, &scm, &renderer)
            .ensure(&agent, &repo, &branch("feature-x"))
            .unwrap();
        assert!(matches!(
            outcome,
            WorktreeOutcome::Created { context: ContextStatus::Written { files: 3 }, .. }
        ));
    }
}
