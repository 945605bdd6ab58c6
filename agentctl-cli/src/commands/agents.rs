//! `agentctl create-agent` and `agentctl list-agents`.

use anyhow::{Context, Result};
use clap::Args;

use crate::Host;

/// Arguments for `agentctl create-agent`.
#[derive(Args, Debug)]
pub struct CreateAgentArgs {
    /// Agent name: letters, digits, `-` and `_`; not `hub` or `ctrl`.
    pub name: String,
}

impl CreateAgentArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let name = super::agent_arg(&self.name)?;
        let paths = host
            .orch()
            .create_agent(&name)
            .with_context(|| format!("failed to create agent '{name}'"))?;
        println!("✓ agent '{name}' at {}", paths.root.display());
        println!("  overlay: {}", paths.overlay.display());
        Ok(())
    }
}

/// Arguments for `agentctl list-agents`.
#[derive(Args, Debug)]
pub struct ListAgentsArgs {}

impl ListAgentsArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let agents = host
            .layout
            .registry()
            .list()
            .context("failed to list agents")?;
        for agent in agents {
            println!("{agent}");
        }
        Ok(())
    }
}
