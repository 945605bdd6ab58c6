//! Settings (`config.yaml`) and the resolved filesystem [`Layout`].
//!
//! # Storage layout
//!
//! ```text
//! <home>/agents/<agent>/            agent root
//!   work/<repo>/                     worktrees; window cwd
//!   work/CONTEXT.md -> global doc    convenience links
//!   work/AGENT.md   -> overlay
//!   logs/
//!   AGENT.md                         overlay document
//! <home>/.agentctl/
//!   mirrors/<repo>.git               shared bare mirrors
//!   locks/                           advisory lock files
//! <home>/.config/agentctl/
//!   config.yaml                      optional settings
//!   repos.txt                        repo name → clone URL
//!   CONTEXT.md                       global context document
//!   last-config                      remembered remote-config name
//!   templates/*.tera                 template overrides
//! ```
//!
//! Every constructor has an explicit-home form (`*_at`) used by tests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, WorkspaceError};
use crate::registry::AgentRegistry;
use crate::types::RepoName;

pub const DEFAULT_SESSION: &str = "hub";
pub const CONTROL_WINDOW: &str = "ctrl";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BASE_REFS: [&str; 4] = ["main", "master", "origin/main", "origin/master"];

/// Generated context bundle targets, written at every worktree root.
pub const CONTEXT_FILENAMES: [&str; 3] = ["CLAUDE.md", "AGENTS.md", "GEMINI.md"];

pub const OVERLAY_FILE: &str = "AGENT.md";
pub const GLOBAL_CONTEXT_FILE: &str = "CONTEXT.md";
pub const CONFIG_FILE: &str = "config.yaml";
pub const REPOS_FILE: &str = "repos.txt";
pub const LAST_CONFIG_FILE: &str = "last-config";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Optional overrides read from `<config>/config.yaml`. Every key may be
/// omitted; relative paths and `~/` are resolved against home.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub session: Option<String>,
    pub agents_dir: Option<PathBuf>,
    pub mirrors_dir: Option<PathBuf>,
    pub global_context: Option<PathBuf>,
    pub repos_file: Option<PathBuf>,
    pub base_refs: Option<Vec<String>>,
    pub region: Option<String>,
    pub shell: Option<String>,
}

impl Settings {
    /// Load `<config_dir>/config.yaml`, returning defaults when it is absent.
    pub fn load_at(config_dir: &Path) -> Result<Self, WorkspaceError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| WorkspaceError::ConfigParse { path, source })
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Every path and name the orchestrator needs, passed explicitly into each
/// component instead of living in globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub home: PathBuf,
    /// Multiplexer session shared by every agent window.
    pub session: String,
    pub agents_dir: PathBuf,
    pub mirrors_dir: PathBuf,
    pub state_dir: PathBuf,
    pub config_dir: PathBuf,
    pub repos_file: PathBuf,
    pub global_context: PathBuf,
    pub templates_dir: PathBuf,
    pub ssh_dir: PathBuf,
    /// Base-ref candidates in priority order; first match wins.
    pub base_refs: Vec<String>,
    pub region: Option<String>,
    /// Login shell for new windows; falls back to `$SHELL`, then `/bin/bash`.
    pub shell: Option<String>,
}

impl Layout {
    /// Default layout rooted at `home`, ignoring any `config.yaml`.
    pub fn defaults_at(home: &Path) -> Self {
        let config_dir = home.join(".config").join("agentctl");
        let state_dir = home.join(".agentctl");
        Self {
            home: home.to_path_buf(),
            session: DEFAULT_SESSION.to_string(),
            agents_dir: home.join("agents"),
            mirrors_dir: state_dir.join("mirrors"),
            repos_file: config_dir.join(REPOS_FILE),
            global_context: config_dir.join(GLOBAL_CONTEXT_FILE),
            templates_dir: config_dir.join("templates"),
            ssh_dir: home.join(".ssh"),
            state_dir,
            config_dir,
            base_refs: DEFAULT_BASE_REFS.iter().map(|s| (*s).to_string()).collect(),
            region: None,
            shell: None,
        }
    }

    /// Defaults for `home` with `config.yaml` from `config_dir` (or the
    /// default config dir) applied on top.
    pub fn load_at(home: &Path, config_dir: Option<&Path>) -> Result<Self, WorkspaceError> {
        let mut layout = Self::defaults_at(home);
        if let Some(dir) = config_dir {
            layout.config_dir = dir.to_path_buf();
            layout.repos_file = dir.join(REPOS_FILE);
            layout.global_context = dir.join(GLOBAL_CONTEXT_FILE);
            layout.templates_dir = dir.join("templates");
        }
        let settings = Settings::load_at(&layout.config_dir)?;
        layout.apply(settings);
        Ok(layout)
    }

    /// `load_at` convenience wrapper using `dirs::home_dir()`.
    pub fn load(config_dir: Option<&Path>) -> Result<Self, WorkspaceError> {
        let home = dirs::home_dir().ok_or(WorkspaceError::HomeNotFound)?;
        Self::load_at(&home, config_dir)
    }

    fn apply(&mut self, settings: Settings) {
        if let Some(session) = settings.session {
            self.session = session;
        }
        if let Some(p) = settings.agents_dir {
            self.agents_dir = self.resolve(&p);
        }
        if let Some(p) = settings.mirrors_dir {
            self.mirrors_dir = self.resolve(&p);
        }
        if let Some(p) = settings.global_context {
            self.global_context = self.resolve(&p);
        }
        if let Some(p) = settings.repos_file {
            self.repos_file = self.resolve(&p);
        }
        if let Some(refs) = settings.base_refs.filter(|r| !r.is_empty()) {
            self.base_refs = refs;
        }
        self.region = settings.region.or(self.region.take());
        self.shell = settings.shell.or(self.shell.take());
    }

    /// Resolve a user-supplied path: `~/x` and relative paths land under home.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if let Ok(rest) = path.strip_prefix("~") {
            return self.home.join(rest);
        }
        if path.is_relative() {
            return self.home.join(path);
        }
        path.to_path_buf()
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.state_dir.join("locks")
    }

    pub fn last_config_file(&self) -> PathBuf {
        self.config_dir.join(LAST_CONFIG_FILE)
    }

    /// `<mirrors>/<repo>.git`
    pub fn mirror_path(&self, repo: &RepoName) -> PathBuf {
        self.mirrors_dir.join(format!("{}.git", repo.as_str()))
    }

    pub fn registry(&self) -> AgentRegistry {
        AgentRegistry::new(&self.agents_dir)
    }

    /// Login shell used for the session and new windows.
    pub fn login_shell(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/bash".to_string())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
