//! `agentctl worktree <agent> <repo> <branch>`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use agentctl_core::{BranchName, RepoName};
use agentctl_workspace::{ContextStatus, WorktreeOutcome};

use crate::Host;

pub const LONG_ABOUT: &str = "\
Check out <branch> of <repo> into <agents>/<agent>/work/<repo>.

The repo's shared mirror is cloned on first use and fetched on every later
call. The new branch starts from the first of main, master, origin/main,
origin/master that exists in the mirror.

WARNING: if <branch> already exists in the mirror it is force-reset to that
base ref (git worktree add -B); commits only reachable from the old branch
tip are no longer referenced by it.

An existing worktree at the target path is left untouched.";

/// Arguments for `agentctl worktree`.
#[derive(Args, Debug)]
pub struct WorktreeArgs {
    /// Agent that owns the worktree (created if missing).
    pub agent: String,
    /// Repo name from the repo mapping document.
    pub repo: String,
    /// Branch to create at the base ref.
    pub branch: String,
}

impl WorktreeArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let agent = super::agent_arg(&self.agent)?;
        let repo = RepoName::parse(&self.repo)?;
        let branch = BranchName::parse(&self.branch)?;

        let outcome = host
            .orch()
            .worktree(&agent, &repo, &branch)
            .with_context(|| format!("failed to provision '{repo}' for '{agent}'"))?;

        match outcome {
            WorktreeOutcome::AlreadyExists { path } => {
                println!("worktree already exists at {}", path.display());
            }
            WorktreeOutcome::Created {
                path,
                branch,
                base,
                context,
            } => {
                println!(
                    "{} {} on '{branch}' (from {base})",
                    "✓ created".green(),
                    path.display()
                );
                if let ContextStatus::Skipped { reason } = context {
                    super::warn(format!("context files not written: {reason}"));
                }
            }
        }
        Ok(())
    }
}
