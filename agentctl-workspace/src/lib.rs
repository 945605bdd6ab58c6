//! # agentctl-workspace
//!
//! The workspace orchestrator: Repo Mirror Cache, Worktree Provisioner,
//! Session/Window Controller and agent lifecycle, all driven through the
//! capability ports from `agentctl-core`.
//!
//! Real adapters ([`Tmux`], [`Git`], [`AwsCli`]) shell out through a
//! [`CommandRunner`]; `fakes` (feature `test-support`) provides in-memory
//! ports for tests.
//!
//! ```rust,no_run
//! use agentctl_core::{AgentName, Layout};
//! use agentctl_renderer::Renderer;
//! use agentctl_workspace::{Git, Orchestrator, SystemRunner, Tmux};
//!
//! fn start(layout: &Layout, name: &AgentName) -> Result<(), Box<dyn std::error::Error>> {
//!     let renderer = Renderer::new()?;
//!     let (tmux, git) = (Tmux::new(SystemRunner), Git::new(SystemRunner));
//!     let report = Orchestrator::new(layout, &renderer, &tmux, &git).start(name)?;
//!     println!("window {}", report.window);
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod aws;
pub mod command;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fakes;
pub mod git;
pub mod mirror;
pub mod orchestrator;
pub mod remote_config;
pub mod session;
pub mod status;
pub mod tmux;
pub mod worktree;

pub use agents::{AgentLifecycle, DeletePlan, DeleteReport, RenameReport};
pub use aws::AwsCli;
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use error::OrchestratorError;
pub use git::Git;
pub use mirror::{MirrorInfo, RepoMirrorCache};
pub use orchestrator::Orchestrator;
pub use remote_config::RemoteConfigReport;
pub use session::{SessionController, StartReport};
pub use status::{AgentStatus, Snapshot, WorktreeStatus};
pub use tmux::Tmux;
pub use worktree::{ContextStatus, Provisioner, WorktreeOutcome};
