//! Agent lifecycle spanning disk and windows: create, rename, delete.

use std::path::PathBuf;

use serde::Serialize;

use agentctl_core::lock::{lock_agent, lock_agents};
use agentctl_core::{
    AgentName, AgentPaths, Layout, Multiplexer, SourceControl, WindowInfo, WorkspaceError,
};
use agentctl_renderer::{OverlayContext, Renderer};
use agentctl_sync::Materializer;

use crate::error::OrchestratorError;
use crate::mirror::RepoMirrorCache;
use crate::session::{refresh_links, SessionController};

/// Create the agent's directories and default overlay if absent.
pub fn ensure_agent(
    layout: &Layout,
    renderer: &Renderer,
    name: &AgentName,
) -> Result<AgentPaths, OrchestratorError> {
    let registry = layout.registry();
    if registry.paths(name).overlay.exists() {
        return Ok(registry.ensure(name, "")?);
    }
    let overlay = renderer.overlay(&OverlayContext::new(&registry.paths(name)))?;
    Ok(registry.ensure(name, &overlay)?)
}

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub renamed_dir: bool,
    pub renamed_window: bool,
    /// Non-fatal conditions worth telling the operator about.
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Everything `delete` would remove, shown to the operator before
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub agent: AgentName,
    pub root: Option<PathBuf>,
    pub worktrees: Vec<PathBuf>,
    pub window: Option<WindowInfo>,
}

impl DeletePlan {
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.window.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub removed_dir: bool,
    pub killed_window: bool,
    pub mirrors_pruned: usize,
}

// ---------------------------------------------------------------------------
// AgentLifecycle
// ---------------------------------------------------------------------------

pub struct AgentLifecycle<'a> {
    layout: &'a Layout,
    mux: &'a dyn Multiplexer,
    scm: &'a dyn SourceControl,
    renderer: &'a Renderer,
}

impl<'a> AgentLifecycle<'a> {
    pub fn new(
        layout: &'a Layout,
        mux: &'a dyn Multiplexer,
        scm: &'a dyn SourceControl,
        renderer: &'a Renderer,
    ) -> Self {
        Self {
            layout,
            mux,
            scm,
            renderer,
        }
    }

    fn sessions(&self) -> SessionController<'a> {
        SessionController::new(self.layout, self.mux, self.renderer)
    }

    pub fn create(&self, name: &AgentName) -> Result<AgentPaths, OrchestratorError> {
        ensure_agent(self.layout, self.renderer, name)
    }

    /// Rename `old` to `new` on disk and in the session.
    ///
    /// All conflicts (directory or window named `new`) are checked before
    /// anything moves. If only one of directory and window exists, that one
    /// is renamed and a warning is reported; if neither exists the agent is
    /// not found.
    pub fn rename(&self, old: &AgentName, new: &AgentName) -> Result<RenameReport, OrchestratorError> {
        let mut report = RenameReport::default();
        if old == new {
            return Ok(report);
        }
        let _locks = lock_agents(&self.layout.locks_dir(), &[old, new])?;

        let registry = self.layout.registry();
        let sessions = self.sessions();
        let to = registry.paths(new);
        if to.root.exists() {
            return Err(WorkspaceError::AgentExists {
                name: new.to_string(),
                path: to.root,
            }
            .into());
        }
        if sessions.find_window(new.as_str())?.is_some() {
            return Err(WorkspaceError::WindowExists {
                session: self.layout.session.clone(),
                name: new.to_string(),
            }
            .into());
        }
        let has_dir = registry.exists(old);
        let has_window = sessions.find_window(old.as_str())?.is_some();
        if !has_dir && !has_window {
            return Err(WorkspaceError::AgentNotFound {
                name: old.to_string(),
            }
            .into());
        }

        if has_dir {
            registry.rename(old, new)?;
            report.renamed_dir = true;
            self.after_move(new, &mut report);
        } else {
            report
                .warnings
                .push(format!("no agent directory found for '{old}'; renamed the window only"));
        }

        if has_window {
            report.renamed_window = sessions.rename_window_if_exists(old, new, &to.work)?;
        } else {
            report
                .warnings
                .push(format!("no workspace window found for '{old}'; renamed on disk only"));
        }

        for warning in &report.warnings {
            tracing::warn!(from = %old, to = %new, "{warning}");
        }
        Ok(report)
    }

    /// Best-effort fixups after the directory moved: re-link worktrees to
    /// their mirrors, refresh convenience links, regenerate context files
    /// (their header names the overlay path).
    fn after_move(&self, new: &AgentName, report: &mut RenameReport) {
        let registry = self.layout.registry();
        let paths = registry.paths(new);
        let worktrees = registry.worktrees(new).unwrap_or_else(|err| {
            report.warnings.push(format!("cannot list worktrees: {err}"));
            vec![]
        });
        let materializer = Materializer::new(self.layout, self.renderer);
        for (repo, path) in worktrees {
            let mirror = self.layout.mirror_path(&repo);
            if mirror.is_dir() {
                if let Err(err) = self.scm.repair_worktrees(&mirror, &[path.clone()]) {
                    report.warnings.push(format!("worktree repair failed for {repo}: {err}"));
                }
            }
            if let Err(err) = materializer.write(new, &path) {
                if !err.is_missing_source() {
                    report.warnings.push(format!("context refresh failed for {repo}: {err}"));
                }
            }
        }
        if let Err(err) = refresh_links(self.layout, &paths) {
            report.warnings.push(format!("could not refresh context links: {err}"));
        }
    }

    /// Describe what deleting `name` would remove.
    pub fn plan_delete(&self, name: &AgentName) -> Result<DeletePlan, OrchestratorError> {
        let registry = self.layout.registry();
        let paths = registry.paths(name);
        let exists = registry.exists(name);
        let worktrees = if exists {
            registry.worktrees(name)?.into_iter().map(|(_, p)| p).collect()
        } else {
            vec![]
        };
        Ok(DeletePlan {
            agent: name.clone(),
            root: exists.then_some(paths.root),
            worktrees,
            window: self.sessions().find_window(name.as_str())?,
        })
    }

    /// Delete `name`'s directory and window.
    ///
    /// Without `force`, `confirm` is shown the plan and must return `true`;
    /// otherwise the call fails with [`WorkspaceError::Cancelled`] and
    /// nothing is touched. Stale worktree records are pruned from every
    /// mirror afterwards.
    pub fn delete<F>(&self, name: &AgentName, force: bool, confirm: F) -> Result<DeleteReport, OrchestratorError>
    where
        F: FnOnce(&DeletePlan) -> Result<bool, WorkspaceError>,
    {
        let _lock = lock_agent(&self.layout.locks_dir(), name)?;
        let plan = self.plan_delete(name)?;
        let mut report = DeleteReport::default();

        if plan.is_empty() && !force {
            tracing::info!(agent = %name, "nothing to delete");
        } else {
            if !force && !confirm(&plan)? {
                return Err(WorkspaceError::Cancelled.into());
            }
            if let Some(window) = &plan.window {
                self.mux.kill_window(&self.layout.session, &window.id)?;
                report.killed_window = true;
            }
            report.removed_dir = self.layout.registry().remove(name)?;
        }

        report.mirrors_pruned = RepoMirrorCache::new(self.layout, self.scm).prune_all_worktrees();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeMultiplexer, FakeSourceControl};
    use tempfile::TempDir;

    fn agent(raw: &str) -> AgentName {
        AgentName::parse(raw).unwrap()
    }

    struct Env {
        _home: TempDir,
        layout: Layout,
        mux: FakeMultiplexer,
        scm: FakeSourceControl,
        renderer: Renderer,
    }

    impl Env {
        fn new() -> Self {
            let home = TempDir::new().unwrap();
            Self {
                layout: Layout::defaults_at(home.path()),
                _home: home,
                mux: FakeMultiplexer::new(),
                scm: FakeSourceControl::new(),
                renderer: Renderer::new().unwrap(),
            }
        }

        fn lifecycle(&self) -> AgentLifecycle<'_> {
            AgentLifecycle::new(&self.layout, &self.mux, &self.scm, &self.renderer)
        }
    }

    #[test]
    fn create_writes_rendered_default_overlay() {
        let env = Env::new();
        let paths = env.lifecycle().create(&agent("a1")).unwrap();
        let overlay = std::fs::read_to_string(paths.overlay).unwrap();
        assert!(overlay.starts_with("# Agent: a1"));
    }

    #[test]
    fn rename_same_name_is_a_noop() {
        let env = Env::new();
        let report = env.lifecycle().rename(&agent("a"), &agent("a")).unwrap();
        assert_eq!(report, RenameReport::default());
    }

    #[test]
    fn rename_directory_only_warns_about_missing_window() {
        let env = Env::new();
        env.lifecycle().create(&agent("a")).unwrap();
        let report = env.lifecycle().rename(&agent("a"), &agent("b")).unwrap();
        assert!(report.renamed_dir);
        assert!(!report.renamed_window);
        assert!(report.warnings.iter().any(|w| w.contains("no workspace window")));
        assert!(env.layout.registry().exists(&agent("b")));
    }

    #[test]
    fn rename_window_only_warns_about_missing_directory() {
        let env = Env::new();
        env.mux.add_window("hub", "a");
        let report = env.lifecycle().rename(&agent("a"), &agent("b")).unwrap();
        assert!(!report.renamed_dir);
        assert!(report.renamed_window);
        assert!(report.warnings.iter().any(|w| w.contains("no agent directory")));
        assert_eq!(env.mux.window_names("hub"), vec!["b"]);
    }

    #[test]
    fn rename_of_nothing_is_not_found() {
        let env = Env::new();
        let err = env.lifecycle().rename(&agent("a"), &agent("b")).unwrap_err();
        assert!(matches!(err, OrchestratorError::Workspace(WorkspaceError::AgentNotFound { .. })));
    }

    #[test]
    fn window_conflict_leaves_directory_in_place() {
        let env = Env::new();
        env.lifecycle().create(&agent("a")).unwrap();
        env.mux.add_window("hub", "b");
        let err = env.lifecycle().rename(&agent("a"), &agent("b")).unwrap_err();
        assert!(matches!(err, OrchestratorError::Workspace(WorkspaceError::WindowExists { .. })));
        assert!(env.layout.registry().exists(&agent("a")));
        assert!(!env.layout.registry().exists(&agent("b")));
    }

    #[test]
    fn delete_declined_changes_nothing() {
        let env = Env::new();
        env.lifecycle().create(&agent("a1")).unwrap();
        env.mux.add_window("hub", "a1");

        let err = env.lifecycle().delete(&agent("a1"), false, |_| Ok(false)).unwrap_err();
        assert!(matches!(err, OrchestratorError::Workspace(WorkspaceError::Cancelled)));
        assert!(env.layout.registry().exists(&agent("a1")));
        assert_eq!(env.mux.window_names("hub"), vec!["a1"]);
    }

    #[test]
    fn delete_confirmed_sees_plan_and_removes_both() {
        let env = Env::new();
        env.lifecycle().create(&agent("a1")).unwrap();
        env.mux.add_window("hub", "a1");

        let report = env
            .lifecycle()
            .delete(&agent("a1"), false, |plan| {
                assert!(plan.root.is_some());
                assert!(plan.window.is_some());
                Ok(true)
            })
            .unwrap();
        assert!(report.removed_dir && report.killed_window);
        assert!(!env.layout.registry().exists(&agent("a1")));
        assert!(env.mux.window_names("hub").is_empty());
    }

    #[test]
    fn delete_of_nothing_succeeds_without_prompt() {
        let env = Env::new();
        let report = env
            .lifecycle()
            .delete(&agent("ghost"), false, |_| panic!("must not prompt"))
            .unwrap();
        assert_eq!(report, DeleteReport::default());
    }

    #[test]
    fn forced_delete_skips_confirmation() {
        let env = Env::new();
        env.lifecycle().create(&agent("a1")).unwrap();
        let report = env
            .lifecycle()
            .delete(&agent("a1"), true, |_| panic!("must not prompt"))
            .unwrap();
        assert!(report.removed_dir);
    }
}
