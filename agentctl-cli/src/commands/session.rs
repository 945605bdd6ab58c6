//! `agentctl session` and `agentctl start`: bring up the shared session and
//! agent windows.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::Host;

/// Arguments for `agentctl session`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Create the session without attaching to it.
    #[arg(long)]
    pub no_attach: bool,
}

impl SessionArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let sessions = host.orch().sessions();
        let created = sessions
            .ensure_session()
            .with_context(|| format!("failed to set up session '{}'", host.layout.session))?;
        if created {
            println!("{} session '{}'", "✓ created".green(), host.layout.session);
        }
        if self.no_attach {
            return Ok(());
        }
        sessions
            .attach(None)
            .with_context(|| format!("failed to attach to '{}'", host.layout.session))
    }
}

/// Arguments for `agentctl start`.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Agent name (created if it does not exist yet).
    pub name: String,

    /// Open the window without attaching to the session.
    #[arg(long)]
    pub no_attach: bool,
}

impl StartArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let name = super::agent_arg(&self.name)?;
        let orch = host.orch();
        let report = orch
            .start(&name)
            .with_context(|| format!("failed to start '{name}'"))?;

        let verb = if report.created { "opened" } else { "selected" };
        println!(
            "✓ {verb} window '{name}' ({}) in {}",
            report.window,
            report.paths.work.display()
        );
        if self.no_attach {
            return Ok(());
        }
        orch.sessions()
            .attach(Some(&report.window))
            .with_context(|| format!("failed to attach to '{}'", host.layout.session))
    }
}
