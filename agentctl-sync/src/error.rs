//! Error types for agentctl-sync.

use std::path::PathBuf;

use thiserror::Error;

use agentctl_core::WorkspaceError;
use agentctl_renderer::RenderError;

/// All errors that can arise from materialization and refresh.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from the agent registry or layout.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document or directory the bundle depends on is absent. Callers
    /// treat this as a skip, not a failure.
    #[error("{what} not found at {path}")]
    MissingSource { what: &'static str, path: PathBuf },
}

impl SyncError {
    pub fn is_missing_source(&self) -> bool {
        matches!(self, SyncError::MissingSource { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
