pub mod agents;
pub mod delete;
pub mod ps;
pub mod refresh;
pub mod rename;
pub mod repos;
pub mod session;
pub mod sync_config;
pub mod worktree;

use anyhow::{Context, Result};
use colored::Colorize;

use agentctl_core::AgentName;

/// Parse an operator-supplied agent name, rejecting reserved names.
pub fn agent_arg(raw: &str) -> Result<AgentName> {
    AgentName::parse(raw).with_context(|| format!("cannot use '{raw}' as an agent name"))
}

/// One-line warning for a best-effort step that did not complete.
pub fn warn(message: impl std::fmt::Display) {
    eprintln!("{} {message}", "warning:".yellow().bold());
}
