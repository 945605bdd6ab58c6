//! `agentctl refresh-context`: regenerate context files in worktrees.

use anyhow::{Context, Result};
use clap::Args;

use agentctl_core::RepoName;
use agentctl_sync::{refresh, RefreshFilter};

use crate::Host;

/// Arguments for `agentctl refresh-context`.
#[derive(Args, Debug)]
pub struct RefreshContextArgs {
    /// Only this agent's worktrees.
    #[arg(long)]
    pub agent: Option<String>,

    /// Only worktrees of this repo.
    #[arg(long)]
    pub repo: Option<String>,

    /// Print unified diffs instead of writing.
    #[arg(long)]
    pub dry_run: bool,
}

impl RefreshContextArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let filter = RefreshFilter {
            agent: self.agent.as_deref().map(super::agent_arg).transpose()?,
            repo: self.repo.as_deref().map(RepoName::parse).transpose()?,
        };
        let report = refresh::run(&host.layout, &host.renderer, &filter, self.dry_run)
            .context("refresh-context failed")?;

        for (root, reason) in &report.skipped {
            super::warn(format!("skipped {}: {reason}", root.display()));
        }

        if self.dry_run {
            for diff in &report.diffs {
                print!("{}", diff.unified_diff);
                if !diff.unified_diff.ends_with('\n') {
                    println!();
                }
            }
            println!(
                "[dry-run] {} worktree(s) checked, {} file(s) would change",
                report.refreshed.len(),
                report.files_changed
            );
        } else {
            println!(
                "{} worktree(s) updated ({} file(s) changed)",
                report.refreshed.len(),
                report.files_changed
            );
        }
        Ok(())
    }
}
