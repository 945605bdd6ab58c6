//! Error types for agentctl-workspace.

use thiserror::Error;

use agentctl_core::{ErrorKind, WorkspaceError};
use agentctl_renderer::RenderError;
use agentctl_sync::SyncError;

/// Any failure of an orchestrator operation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Workspace(e) | OrchestratorError::Sync(SyncError::Workspace(e)) => {
                e.kind()
            }
            OrchestratorError::Sync(SyncError::MissingSource { .. }) => ErrorKind::NotFound,
            OrchestratorError::Sync(_) | OrchestratorError::Render(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn kind_passes_through_workspace_errors() {
        let err: OrchestratorError = WorkspaceError::Cancelled.into();
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        let err: OrchestratorError = SyncError::Workspace(WorkspaceError::AgentNotFound {
            name: "a1".into(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn missing_source_is_not_found() {
        let err: OrchestratorError = SyncError::MissingSource {
            what: "agent overlay",
            path: PathBuf::from("/agents/a1/AGENT.md"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("/agents/a1/AGENT.md"));
    }
}
