//! `agentctl rename <old> <new>`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::Host;

/// Arguments for `agentctl rename`.
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Current agent name.
    pub old: String,
    /// New agent name; must not exist on disk or as a window.
    pub new: String,
}

impl RenameArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let old = super::agent_arg(&self.old)?;
        let new = super::agent_arg(&self.new)?;
        let report = host
            .orch()
            .rename(&old, &new)
            .with_context(|| format!("failed to rename '{old}' to '{new}'"))?;

        for warning in &report.warnings {
            super::warn(warning);
        }
        if report.renamed_dir || report.renamed_window {
            println!("{} '{old}' → '{new}'", "✓ renamed".green());
        }
        Ok(())
    }
}
