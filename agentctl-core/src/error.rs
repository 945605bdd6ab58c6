//! Error types for agentctl-core.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by callers to decide between aborting,
/// skipping, and printing usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong argument shape or a missing required value.
    Usage,
    /// Unknown repo, missing mapping entry, missing document or agent.
    NotFound,
    /// Target already exists, reserved name, window name collision.
    Conflict,
    /// An underlying CLI (`git`, `tmux`, `aws`) failed.
    ExternalTool,
    /// Filesystem or lock failure.
    Io,
    /// The operator declined a confirmation prompt.
    Cancelled,
}

/// All errors that can arise from workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Name failed validation (empty, unsafe characters, …).
    #[error("invalid {what} name '{name}': {reason}")]
    InvalidName {
        what: &'static str,
        name: String,
        reason: &'static str,
    },

    /// One of the control names was used as an agent name.
    #[error("'{name}' is a reserved name and cannot be used as an agent")]
    ReservedName { name: String },

    #[error("agent '{name}' already exists at {path}")]
    AgentExists { name: String, path: PathBuf },

    #[error("agent '{name}' not found")]
    AgentNotFound { name: String },

    #[error("window '{name}' already exists in session '{session}'")]
    WindowExists { session: String, name: String },

    #[error("repo mapping not found at {path}; run `agentctl sync-config` or create it")]
    RepoMapMissing { path: PathBuf },

    #[error("unknown repo '{name}': not listed in {path}")]
    UnknownRepo { name: String, path: PathBuf },

    /// None of the base-ref candidates resolved inside the mirror.
    #[error(
        "no base branch found in {dir} (tried: {tried}); inspect branches with `git -C {dir} branch -a`",
        dir = .mirror.display()
    )]
    NoBaseRef { mirror: PathBuf, tried: String },

    /// An external command exited nonzero or could not be spawned.
    #[error("`{tool} {args}` failed: {stderr}")]
    Tool {
        tool: String,
        args: String,
        stderr: String,
    },

    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: nix::errno::Errno,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("{0}")]
    Usage(String),

    #[error("cancelled")]
    Cancelled,
}

impl WorkspaceError {
    /// Classify this error into the operator-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkspaceError::Usage(_) | WorkspaceError::InvalidName { .. } => ErrorKind::Usage,
            WorkspaceError::AgentNotFound { .. }
            | WorkspaceError::RepoMapMissing { .. }
            | WorkspaceError::UnknownRepo { .. }
            | WorkspaceError::NoBaseRef { .. }
            | WorkspaceError::HomeNotFound => ErrorKind::NotFound,
            WorkspaceError::ReservedName { .. }
            | WorkspaceError::AgentExists { .. }
            | WorkspaceError::WindowExists { .. } => ErrorKind::Conflict,
            WorkspaceError::Tool { .. } => ErrorKind::ExternalTool,
            WorkspaceError::Io { .. }
            | WorkspaceError::ConfigParse { .. }
            | WorkspaceError::Lock { .. } => ErrorKind::Io,
            WorkspaceError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Convenience constructor for [`WorkspaceError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io {
        path: path.into(),
        source,
    }
}
