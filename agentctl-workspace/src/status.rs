//! Status snapshot behind `agentctl ps`.

use std::path::PathBuf;

use serde::Serialize;

use agentctl_core::layout::CONTROL_WINDOW;
use agentctl_core::{Layout, Multiplexer, SourceControl, WindowInfo, WorkspaceError};

use crate::mirror::{MirrorInfo, RepoMirrorCache};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeStatus {
    pub repo: String,
    /// `None` when detached or unreadable.
    pub branch: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    pub name: String,
    pub path: PathBuf,
    pub window: Option<WindowInfo>,
    pub worktrees: Vec<WorktreeStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub session: String,
    pub running: bool,
    pub windows: Vec<WindowInfo>,
    pub agents: Vec<AgentStatus>,
    /// Windows with no agent directory, other than the control window.
    pub orphan_windows: Vec<String>,
    pub mirrors: Vec<MirrorInfo>,
}

pub fn snapshot(
    layout: &Layout,
    mux: &dyn Multiplexer,
    scm: &dyn SourceControl,
) -> Result<Snapshot, WorkspaceError> {
    let running = mux.has_session(&layout.session)?;
    let windows = if running {
        mux.list_windows(&layout.session)?
    } else {
        vec![]
    };

    let registry = layout.registry();
    let names = registry.list()?;
    let mut agents = Vec::with_capacity(names.len());
    for name in &names {
        let worktrees = registry
            .worktrees(name)?
            .into_iter()
            .map(|(repo, path)| {
                let branch = scm.current_branch(&path).unwrap_or_else(|err| {
                    tracing::debug!(repo = %repo, error = %err, "cannot read branch");
                    None
                });
                WorktreeStatus {
                    repo: repo.to_string(),
                    branch,
                    path,
                }
            })
            .collect();
        agents.push(AgentStatus {
            name: name.to_string(),
            path: registry.paths(name).root,
            window: windows.iter().find(|w| w.name == name.as_str()).cloned(),
            worktrees,
        });
    }

    let orphan_windows = windows
        .iter()
        .filter(|w| w.name != CONTROL_WINDOW && !names.iter().any(|n| n.as_str() == w.name))
        .map(|w| w.name.clone())
        .collect();

    Ok(Snapshot {
        session: layout.session.clone(),
        running,
        windows,
        agents,
        orphan_windows,
        mirrors: RepoMirrorCache::new(layout, scm).list()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeMultiplexer, FakeSourceControl};
    use agentctl_core::AgentName;
    use tempfile::TempDir;

    #[test]
    fn empty_host_reports_stopped_session() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let snap = snapshot(&layout, &FakeMultiplexer::new(), &FakeSourceControl::new()).unwrap();
        assert!(!snap.running);
        assert!(snap.agents.is_empty() && snap.mirrors.is_empty());
    }

    #[test]
    fn joins_agents_with_windows() {
        let home = TempDir::new().unwrap();
        let layout = Layout::defaults_at(home.path());
        let registry = layout.registry();
        registry.ensure(&AgentName::parse("a1").unwrap(), "").unwrap();
        registry.ensure(&AgentName::parse("b2").unwrap(), "").unwrap();
        let mux = FakeMultiplexer::new();
        mux.add_window("hub", "ctrl");
        mux.add_window("hub", "a1");
        mux.add_window("hub", "stray");

        let snap = snapshot(&layout, &mux, &FakeSourceControl::new()).unwrap();
        assert!(snap.running);
        assert_eq!(snap.agents.len(), 2);
        assert!(snap.agents[0].window.is_some());
        assert!(snap.agents[1].window.is_none());
        assert_eq!(snap.orphan_windows, vec!["stray"]);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["agents"][0]["name"], "a1");
    }
}
