//! agentctl: shared-host workspace manager for coding agents.
//!
//! # Usage
//!
//! ```text
//! agentctl session
//! agentctl create-agent <name>
//! agentctl start <name> [--no-attach]
//! agentctl worktree <agent> <repo> <branch>
//! agentctl list-repos
//! agentctl list-agents
//! agentctl ps [--json]
//! agentctl delete <name> [--force]
//! agentctl rename <old> <new>
//! agentctl refresh-context [--agent <name>] [--repo <repo>] [--dry-run]
//! agentctl sync-config [name] [--region <region>]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use agentctl_core::Layout;
use agentctl_renderer::Renderer;
use agentctl_workspace::{Git, Orchestrator, SystemRunner, Tmux};

use commands::{
    agents::{CreateAgentArgs, ListAgentsArgs},
    delete::DeleteArgs,
    ps::PsArgs,
    refresh::RefreshContextArgs,
    rename::RenameArgs,
    repos::ListReposArgs,
    session::{SessionArgs, StartArgs},
    sync_config::SyncConfigArgs,
    worktree::WorktreeArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "agentctl",
    version,
    about = "Manage per-agent tmux windows, git worktrees and context files on a shared host",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of `config.yaml`.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// tmux session shared by every agent window.
    #[arg(long, global = true, env = "AGENTCTL_SESSION")]
    pub session: Option<String>,

    /// Base directory holding one subdirectory per agent.
    #[arg(long, global = true, env = "AGENTCTL_AGENTS_DIR")]
    pub agents_dir: Option<PathBuf>,

    /// Directory holding the bare mirror clones.
    #[arg(long, global = true, env = "AGENTCTL_MIRRORS_DIR")]
    pub mirrors_dir: Option<PathBuf>,

    /// User config directory (repos.txt, CONTEXT.md, config.yaml).
    #[arg(long, global = true, env = "AGENTCTL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ensure the shared session exists and attach to it.
    Session(SessionArgs),

    /// Create an agent workspace (idempotent).
    CreateAgent(CreateAgentArgs),

    /// Open (or re-select) the agent's window, then attach.
    Start(StartArgs),

    /// Check out a repo branch into an agent's workspace.
    #[command(long_about = commands::worktree::LONG_ABOUT)]
    Worktree(WorktreeArgs),

    /// Print the configured repo names, one per line.
    ListRepos(ListReposArgs),

    /// Print the agent names, one per line.
    ListAgents(ListAgentsArgs),

    /// Show session, window, worktree and mirror status.
    Ps(PsArgs),

    /// Delete an agent's workspace and window.
    Delete(DeleteArgs),

    /// Rename an agent on disk and in the session.
    Rename(RenameArgs),

    /// Regenerate CLAUDE.md / AGENTS.md / GEMINI.md in agent worktrees.
    RefreshContext(RefreshContextArgs),

    /// Pull the shared SSH key and repo mapping from AWS.
    SyncConfig(SyncConfigArgs),
}

// ---------------------------------------------------------------------------
// Host: resolved layout plus the real adapters
// ---------------------------------------------------------------------------

pub struct Host {
    pub layout: Layout,
    pub renderer: Renderer,
    pub tmux: Tmux<SystemRunner>,
    pub git: Git<SystemRunner>,
}

impl Host {
    pub fn load(opts: &GlobalOpts) -> Result<Self> {
        let mut layout = Layout::load(opts.config_dir.as_deref()).context("failed to load settings")?;
        if let Some(session) = &opts.session {
            layout.session = session.clone();
        }
        if let Some(dir) = &opts.agents_dir {
            layout.agents_dir = layout.resolve(dir);
        }
        if let Some(dir) = &opts.mirrors_dir {
            layout.mirrors_dir = layout.resolve(dir);
        }

        let renderer = if layout.templates_dir.is_dir() {
            Renderer::with_overrides(&layout.templates_dir)
        } else {
            Renderer::new()
        }
        .with_context(|| format!("failed to load templates from {}", layout.templates_dir.display()))?;

        tracing::debug!(
            session = %layout.session,
            agents = %layout.agents_dir.display(),
            mirrors = %layout.mirrors_dir.display(),
            "resolved layout"
        );
        Ok(Self {
            layout,
            renderer,
            tmux: Tmux::new(SystemRunner),
            git: Git::new(SystemRunner),
        })
    }

    pub fn orch(&self) -> Orchestrator<'_> {
        Orchestrator::new(&self.layout, &self.renderer, &self.tmux, &self.git)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("AGENTCTL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let host = Host::load(&cli.global)?;
    match cli.command {
        Commands::Session(args) => args.run(&host),
        Commands::CreateAgent(args) => args.run(&host),
        Commands::Start(args) => args.run(&host),
        Commands::Worktree(args) => args.run(&host),
        Commands::ListRepos(args) => args.run(&host),
        Commands::ListAgents(args) => args.run(&host),
        Commands::Ps(args) => args.run(&host),
        Commands::Delete(args) => args.run(&host),
        Commands::Rename(args) => args.run(&host),
        Commands::RefreshContext(args) => args.run(&host),
        Commands::SyncConfig(args) => args.run(&host),
    }
}
