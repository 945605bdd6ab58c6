//! Session/Window Controller.
//!
//! One multiplexer session for the whole host; its first window is the
//! control window, every other window belongs to the agent of the same
//! name. Starting an agent that already has a window only re-selects it.

use std::collections::BTreeSet;
use std::path::Path;

use agentctl_core::error::io_err;
use agentctl_core::layout::{CONTROL_WINDOW, GLOBAL_CONTEXT_FILE, OVERLAY_FILE};
use agentctl_core::lock::lock_agent;
use agentctl_core::{AgentName, AgentPaths, Layout, Multiplexer, WindowId, WindowInfo, WorkspaceError};
use agentctl_renderer::{BannerContext, Renderer};

use crate::agents::ensure_agent;
use crate::error::OrchestratorError;

/// What `start` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub window: WindowId,
    /// `false` when an existing window was re-selected.
    pub created: bool,
    pub paths: AgentPaths,
}

pub struct SessionController<'a> {
    layout: &'a Layout,
    mux: &'a dyn Multiplexer,
    renderer: &'a Renderer,
}

impl<'a> SessionController<'a> {
    pub fn new(layout: &'a Layout, mux: &'a dyn Multiplexer, renderer: &'a Renderer) -> Self {
        Self {
            layout,
            mux,
            renderer,
        }
    }

    fn session(&self) -> &str {
        &self.layout.session
    }

    /// Create the session if needed and (re)apply shell, key bindings and
    /// environment. Returns `true` when the session was created.
    pub fn ensure_session(&self) -> Result<bool, WorkspaceError> {
        let shell = self.layout.login_shell();
        let created = if self.mux.has_session(self.session())? {
            false
        } else {
            tracing::info!(session = %self.session(), "creating session");
            self.mux.new_session(self.session(), CONTROL_WINDOW, &shell)?;
            true
        };
        self.mux.configure_session(self.session(), &shell)?;
        if let Ok(path) = std::env::var("PATH") {
            self.mux.set_environment(self.session(), "PATH", &path)?;
        }
        self.mux.set_environment(self.session(), "SHELL", &shell)?;
        Ok(created)
    }

    pub fn find_window(&self, name: &str) -> Result<Option<WindowInfo>, WorkspaceError> {
        Ok(self
            .mux
            .list_windows(self.session())?
            .into_iter()
            .find(|w| w.name == name))
    }

    /// Bring up the agent's window, creating session, agent and window as
    /// needed, then type the banner into it.
    pub fn start_agent_window(&self, agent: &AgentName) -> Result<StartReport, OrchestratorError> {
        let _lock = lock_agent(&self.layout.locks_dir(), agent)?;
        self.ensure_session()?;
        let paths = ensure_agent(self.layout, self.renderer, agent)?;
        if let Err(err) = refresh_links(self.layout, &paths) {
            tracing::warn!(agent = %agent, error = %err, "could not refresh context links");
        }

        let shell = self.layout.login_shell();
        let (window, created) = match self.find_window(agent.as_str())? {
            Some(existing) => (existing.id, false),
            None => {
                tracing::info!(agent = %agent, "creating window");
                let id = self
                    .mux
                    .new_window(self.session(), agent.as_str(), &paths.work, &shell)?;
                (id, true)
            }
        };
        self.mux.select_window(self.session(), &window)?;
        self.mux.rename_window(self.session(), &window, agent.as_str())?;
        self.mux.set_default_path(self.session(), &window, &paths.work)?;

        let banner = self
            .renderer
            .banner(&BannerContext::new(&paths, &self.layout.global_context))?;
        for line in banner {
            self.mux.send_line(self.session(), &window, &line)?;
        }

        Ok(StartReport {
            window,
            created,
            paths,
        })
    }

    /// Rename the window `old` to `new` and point it at `work`. Fails with
    /// [`WorkspaceError::WindowExists`] if `new` is taken; `Ok(false)` when
    /// there is no window `old`.
    pub fn rename_window_if_exists(
        &self,
        old: &AgentName,
        new: &AgentName,
        work: &Path,
    ) -> Result<bool, WorkspaceError> {
        let windows = self.mux.list_windows(self.session())?;
        if windows.iter().any(|w| w.name == new.as_str()) {
            return Err(WorkspaceError::WindowExists {
                session: self.session().to_string(),
                name: new.to_string(),
            });
        }
        let Some(window) = windows.into_iter().find(|w| w.name == old.as_str()) else {
            return Ok(false);
        };
        self.mux.rename_window(self.session(), &window.id, new.as_str())?;
        self.mux.set_default_path(self.session(), &window.id, work)?;
        tracing::info!(from = %old, to = %new, "renamed window");
        Ok(true)
    }

    /// Kill the window named `name`; `Ok(false)` when there is none.
    pub fn kill_window_if_exists(&self, name: &AgentName) -> Result<bool, WorkspaceError> {
        match self.find_window(name.as_str())? {
            Some(window) => {
                self.mux.kill_window(self.session(), &window.id)?;
                tracing::info!(agent = %name, "killed window");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn list_live_windows(&self) -> Result<BTreeSet<String>, WorkspaceError> {
        Ok(self
            .mux
            .list_windows(self.session())?
            .into_iter()
            .map(|w| w.name)
            .collect())
    }

    /// Attach to the session, optionally focusing `window`.
    pub fn attach(&self, window: Option<&WindowId>) -> Result<(), WorkspaceError> {
        self.mux.attach(self.session(), window)
    }
}

/// (Re)create `work/CONTEXT.md` and `work/AGENT.md` as links to the global
/// document and the agent's overlay.
pub fn refresh_links(layout: &Layout, paths: &AgentPaths) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(&paths.work).map_err(|e| io_err(&paths.work, e))?;
    replace_link(&layout.global_context, &paths.work.join(GLOBAL_CONTEXT_FILE))?;
    replace_link(&paths.overlay, &paths.work.join(OVERLAY_FILE))
}

fn replace_link(target: &Path, link: &Path) -> Result<(), WorkspaceError> {
    if std::fs::symlink_metadata(link).is_ok() {
        std::fs::remove_file(link).map_err(|e| io_err(link, e))?;
    }
    symlink(target, link).map_err(|e| io_err(link, e))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::fs::copy(target, link).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeMultiplexer;
    use tempfile::TempDir;

    fn agent(raw: &str) -> AgentName {
        AgentName::parse(raw).unwrap()
    }

    #[test]
    fn ensure_session_creates_control_window_once() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        let renderer = Renderer::new().unwrap();
        let ctl = SessionController::new(&layout, &mux, &renderer);

        assert!(ctl.ensure_session().unwrap());
        assert!(!ctl.ensure_session().unwrap());
        assert_eq!(mux.window_names("hub"), vec!["ctrl"]);
        let session = mux.session("hub").unwrap();
        assert_eq!(session.env.get("SHELL"), Some(&layout.login_shell()));
    }

    #[test]
    fn start_creates_window_then_reselects() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        let renderer = Renderer::new().unwrap();
        let ctl = SessionController::new(&layout, &mux, &renderer);

        let first = ctl.start_agent_window(&agent("a1")).unwrap();
        assert!(first.created);
        assert!(first.paths.work.is_dir());
        let second = ctl.start_agent_window(&agent("a1")).unwrap();
        assert!(!second.created);
        assert_eq!(first.window, second.window);
        assert_eq!(mux.window_names("hub"), vec!["ctrl", "a1"]);

        let window = mux.window("hub", "a1").unwrap();
        assert!(window.active);
        assert_eq!(window.default_path.as_deref(), Some(first.paths.work.as_path()));
        let banner = mux.sent_to(&first.window);
        assert!(!banner.is_empty());
        assert!(banner.iter().all(|l| l.starts_with('#')));
    }

    #[test]
    fn start_links_context_documents() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        let renderer = Renderer::new().unwrap();
        let report = SessionController::new(&layout, &mux, &renderer)
            .start_agent_window(&agent("a1"))
            .unwrap();

        let overlay_link = report.paths.work.join("AGENT.md");
        assert_eq!(std::fs::read_link(&overlay_link).unwrap(), report.paths.overlay);
        let global_link = report.paths.work.join("CONTEXT.md");
        assert_eq!(std::fs::read_link(&global_link).unwrap(), layout.global_context);
    }

    #[test]
    fn rename_refuses_taken_window_name() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        mux.add_window("hub", "a");
        mux.add_window("hub", "b");
        let renderer = Renderer::new().unwrap();
        let ctl = SessionController::new(&layout, &mux, &renderer);

        let err = ctl
            .rename_window_if_exists(&agent("a"), &agent("b"), Path::new("/w"))
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::WindowExists { .. }));
        assert_eq!(mux.window_names("hub"), vec!["a", "b"]);
    }

    #[test]
    fn rename_and_kill_are_noops_when_absent() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        let renderer = Renderer::new().unwrap();
        let ctl = SessionController::new(&layout, &mux, &renderer);

        assert!(!ctl.rename_window_if_exists(&agent("a"), &agent("b"), Path::new("/w")).unwrap());
        assert!(!ctl.kill_window_if_exists(&agent("a")).unwrap());
        assert!(ctl.list_live_windows().unwrap().is_empty());
    }

    #[test]
    fn rename_updates_default_path() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let mux = FakeMultiplexer::new();
        mux.add_window("hub", "a");
        let renderer = Renderer::new().unwrap();
        let ctl = SessionController::new(&layout, &mux, &renderer);

        assert!(ctl.rename_window_if_exists(&agent("a"), &agent("z"), Path::new("/agents/z/work")).unwrap());
        let window = mux.window("hub", "z").expect("renamed");
        assert_eq!(window.default_path.as_deref(), Some(Path::new("/agents/z/work")));
    }
}
