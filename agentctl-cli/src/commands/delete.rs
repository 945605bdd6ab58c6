//! `agentctl delete <name> [--force]`.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use agentctl_core::WorkspaceError;
use agentctl_workspace::DeletePlan;

use crate::Host;

/// Arguments for `agentctl delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Agent to delete.
    pub name: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub force: bool,
}

impl DeleteArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let name = super::agent_arg(&self.name)?;
        let report = host
            .orch()
            .delete(&name, self.force, confirm)
            .with_context(|| format!("delete '{name}' aborted"))?;

        if !report.removed_dir && !report.killed_window {
            println!("nothing to delete for '{name}'");
        } else {
            println!("{} agent '{name}'", "✓ deleted".green());
        }
        Ok(())
    }
}

/// Show the plan and require the agent name typed back on stdin.
fn confirm(plan: &DeletePlan) -> Result<bool, WorkspaceError> {
    println!("This will permanently remove:");
    if let Some(root) = &plan.root {
        println!("  directory {}", root.display());
        for tree in &plan.worktrees {
            println!("    worktree {}", tree.display());
        }
    }
    if let Some(window) = &plan.window {
        println!("  window    {} ({})", window.name, window.id);
    }
    print!("Type '{}' to confirm: ", plan.agent);

    let stdin_err = |e| agentctl_core::error::io_err("<stdin>", e);
    std::io::stdout().flush().map_err(stdin_err)?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(stdin_err)?;
    Ok(line.trim() == plan.agent.as_str())
}
