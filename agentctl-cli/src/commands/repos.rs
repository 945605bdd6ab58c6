//! `agentctl list-repos`: names from the repo mapping document.

use anyhow::Result;
use clap::Args;

use agentctl_core::RepoMap;

use crate::Host;

/// Arguments for `agentctl list-repos`.
#[derive(Args, Debug)]
pub struct ListReposArgs {
    /// Print `name url` pairs instead of names only.
    #[arg(long)]
    pub urls: bool,
}

impl ListReposArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let map = RepoMap::load(&host.layout.repos_file)?;
        for name in map.names() {
            if self.urls {
                println!("{name} {}", map.resolve(name)?);
            } else {
                println!("{name}");
            }
        }
        Ok(())
    }
}
