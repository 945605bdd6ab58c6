//! `agentctl ps`: session, agent and mirror status.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use agentctl_workspace::{AgentStatus, MirrorInfo, Snapshot};

use crate::Host;

/// Arguments for `agentctl ps`.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PsArgs {
    pub fn run(self, host: &Host) -> Result<()> {
        let snap = host.orch().status().context("failed to collect status")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&snap).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_tables(&snap);
        Ok(())
    }
}

#[derive(Tabled)]
struct AgentRow {
    #[tabled(rename = "agent")]
    name: String,
    #[tabled(rename = "window")]
    window: String,
    #[tabled(rename = "worktrees")]
    worktrees: String,
    #[tabled(rename = "path")]
    path: String,
}

#[derive(Tabled)]
struct MirrorRow {
    #[tabled(rename = "repo")]
    repo: String,
    #[tabled(rename = "last fetched")]
    last_fetched: String,
    #[tabled(rename = "path")]
    path: String,
}

fn print_tables(snap: &Snapshot) {
    let state = if snap.running {
        format!("running, {} window(s)", snap.windows.len()).green()
    } else {
        "not running".yellow()
    };
    println!("{} {} | {state}", "session".bold(), snap.session);

    if snap.agents.is_empty() {
        println!("No agents. Create one with `agentctl create-agent <name>`.");
    } else {
        let mut table = Table::new(snap.agents.iter().map(agent_row));
        table.with(Style::rounded());
        println!("{table}");
    }

    if !snap.orphan_windows.is_empty() {
        println!(
            "{} {}",
            "windows without an agent directory:".yellow(),
            snap.orphan_windows.join(", ")
        );
    }

    if !snap.mirrors.is_empty() {
        let mut table = Table::new(snap.mirrors.iter().map(mirror_row));
        table.with(Style::rounded());
        println!("{table}");
    }
}

fn agent_row(agent: &AgentStatus) -> AgentRow {
    let window = match &agent.window {
        Some(w) if w.active => format!("{} (active)", w.id),
        Some(w) => w.id.to_string(),
        None => "-".to_string(),
    };
    let worktrees = if agent.worktrees.is_empty() {
        "-".to_string()
    } else {
        agent
            .worktrees
            .iter()
            .map(|t| format!("{}@{}", t.repo, t.branch.as_deref().unwrap_or("(detached)")))
            .collect::<Vec<_>>()
            .join(", ")
    };
    AgentRow {
        name: agent.name.clone(),
        window,
        worktrees,
        path: agent.path.display().to_string(),
    }
}

fn mirror_row(mirror: &MirrorInfo) -> MirrorRow {
    MirrorRow {
        repo: mirror.repo.clone(),
        last_fetched: mirror
            .last_fetched
            .map(|t| format!("{} ago", format_age(t, Utc::now())))
            .unwrap_or_else(|| "never".to_string()),
        path: mirror.path.display().to_string(),
    }
}

fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
