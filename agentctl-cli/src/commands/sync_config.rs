//! `agentctl sync-config [name]`: pull shared config from AWS.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use agentctl_workspace::remote_config::{resolve_name, resolve_region, sync_config};
use agentctl_workspace::{AwsCli, SystemRunner};

use crate::Host;

/// Arguments for `agentctl sync-config`.
#[derive(Args, Debug)]
pub struct SyncConfigArgs {
    /// Config name; defaults to the last one synced.
    pub name: Option<String>,

    /// AWS region (falls back to AWS_REGION, config.yaml, us-east-1).
    #[arg(long)]
    pub region: Option<String>,
}

impl SyncConfigArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let name = resolve_name(self.name.as_deref(), &host.layout)?;
        let region = resolve_region(
            self.region.as_deref(),
            std::env::var("AWS_REGION").ok(),
            &host.layout,
        );

        let store = AwsCli::new(SystemRunner);
        let report = sync_config(&host.layout, &store, &name, &region)
            .with_context(|| format!("failed to sync config '{name}' from {region}"))?;

        println!("{} config '{}' ({})", "✓ synced".green(), report.name, report.region);
        println!("  ssh key: {}", report.key_path.display());
        println!(
            "  repos:   {} ({} repo(s))",
            report.repos_file.display(),
            report.repo_count
        );
        Ok(())
    }
}
