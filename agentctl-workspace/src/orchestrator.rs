//! [`Orchestrator`]: the components wired to one layout and set of ports.

use agentctl_core::{
    AgentName, AgentPaths, BranchName, Layout, Multiplexer, RepoName, SourceControl, WorkspaceError,
};
use agentctl_renderer::Renderer;

use crate::agents::{AgentLifecycle, DeletePlan, DeleteReport, RenameReport};
use crate::error::OrchestratorError;
use crate::session::{SessionController, StartReport};
use crate::status::{snapshot, Snapshot};
use crate::worktree::{Provisioner, WorktreeOutcome};

pub struct Orchestrator<'a> {
    layout: &'a Layout,
    renderer: &'a Renderer,
    mux: &'a dyn Multiplexer,
    scm: &'a dyn SourceControl,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        layout: &'a Layout,
        renderer: &'a Renderer,
        mux: &'a dyn Multiplexer,
        scm: &'a dyn SourceControl,
    ) -> Self {
        Self {
            layout,
            renderer,
            mux,
            scm,
        }
    }

    pub fn sessions(&self) -> SessionController<'a> {
        SessionController::new(self.layout, self.mux, self.renderer)
    }

    pub fn agents(&self) -> AgentLifecycle<'a> {
        AgentLifecycle::new(self.layout, self.mux, self.scm, self.renderer)
    }

    pub fn provisioner(&self) -> Provisioner<'a> {
        Provisioner::new(self.layout, self.scm, self.renderer)
    }

    // -----------------------------------------------------------------------
    // Command-level operations
    // -----------------------------------------------------------------------

    pub fn create_agent(&self, name: &AgentName) -> Result<AgentPaths, OrchestratorError> {
        self.agents().create(name)
    }

    pub fn start(&self, name: &AgentName) -> Result<StartReport, OrchestratorError> {
        self.sessions().start_agent_window(name)
    }

    pub fn worktree(
        &self,
        agent: &AgentName,
        repo: &RepoName,
        branch: &BranchName,
    ) -> Result<WorktreeOutcome, OrchestratorError> {
        self.provisioner().ensure(agent, repo, branch)
    }

    pub fn rename(&self, old: &AgentName, new: &AgentName) -> Result<RenameReport, OrchestratorError> {
        self.agents().rename(old, new)
    }

    pub fn delete<F>(&self, name: &AgentName, force: bool, confirm: F) -> Result<DeleteReport, OrchestratorError>
    where
        F: FnOnce(&DeletePlan) -> Result<bool, WorkspaceError>,
    {
        self.agents().delete(name, force, confirm)
    }

    pub fn status(&self) -> Result<Snapshot, WorkspaceError> {
        snapshot(self.layout, self.mux, self.scm)
    }
}
