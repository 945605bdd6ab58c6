//! Domain types for agentctl.
//!
//! Names are validated once at construction; everything downstream can treat
//! an [`AgentName`] as a safe path component and multiplexer window name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;

/// Control names that can never be used for an agent: the multiplexer session
/// and its control window.
pub const RESERVED_NAMES: [&str; 2] = ["hub", "ctrl"];

const MAX_NAME_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A filesystem-safe agent name, doubling as its multiplexer window name.
///
/// Allowed characters are ASCII letters, digits, `-` and `_`; `.` and `:` are
/// excluded because tmux treats them as target separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentName(String);

impl AgentName {
    /// Validate `raw` as an agent name. Reserved names are rejected with
    /// [`WorkspaceError::ReservedName`].
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        validate("agent", raw, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')?;
        if RESERVED_NAMES.contains(&raw) {
            return Err(WorkspaceError::ReservedName {
                name: raw.to_owned(),
            });
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A repository name as listed in the repo mapping document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        validate("repo", raw, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
        })?;
        if raw.starts_with('.') {
            return Err(invalid("repo", raw, "must not start with '.'"));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A git branch name. Only the shape that would confuse argument parsing is
/// checked here; git itself enforces the full ref-format rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        if raw.is_empty() {
            return Err(invalid("branch", raw, "must not be empty"));
        }
        if raw.starts_with('-') {
            return Err(invalid("branch", raw, "must not start with '-'"));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("branch", raw, "must not contain whitespace"));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! name_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $ty {
            type Err = WorkspaceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = WorkspaceError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$ty> for String {
            fn from(n: $ty) -> Self {
                n.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_impls!(AgentName);
name_impls!(RepoName);
name_impls!(BranchName);

fn invalid(what: &'static str, raw: &str, reason: &'static str) -> WorkspaceError {
    WorkspaceError::InvalidName {
        what,
        name: raw.to_owned(),
        reason,
    }
}

fn validate(
    what: &'static str,
    raw: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), WorkspaceError> {
    if raw.is_empty() {
        return Err(invalid(what, raw, "must not be empty"));
    }
    if raw.len() > MAX_NAME_LEN {
        return Err(invalid(what, raw, "must be at most 64 characters"));
    }
    if raw.starts_with('-') {
        return Err(invalid(what, raw, "must not start with '-'"));
    }
    if !raw.chars().all(allowed) {
        return Err(invalid(what, raw, "contains characters that are not filesystem-safe"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Agent paths
// ---------------------------------------------------------------------------

/// Resolved on-disk locations for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPaths {
    pub name: AgentName,
    /// `<agents>/<name>`
    pub root: PathBuf,
    /// `<root>/work`: container for per-repo worktrees; the window's cwd.
    pub work: PathBuf,
    /// `<root>/logs`
    pub logs: PathBuf,
    /// `<root>/AGENT.md`: the per-agent overlay document.
    pub overlay: PathBuf,
}

impl AgentPaths {
    /// Worktree location for `repo` inside this agent's work root.
    pub fn worktree(&self, repo: &RepoName) -> PathBuf {
        self.work.join(repo.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a1")]
    #[case("backend-fixer")]
    #[case("agent_07")]
    fn valid_agent_names(#[case] raw: &str) {
        assert_eq!(AgentName::parse(raw).expect("valid").as_str(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("dot.ted")]
    #[case("colon:name")]
    #[case("../escape")]
    #[case("-flag")]
    fn invalid_agent_names(#[case] raw: &str) {
        let err = AgentName::parse(raw).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidName { .. }), "got: {err}");
    }

    #[rstest]
    #[case("hub")]
    #[case("ctrl")]
    fn reserved_agent_names(#[case] raw: &str) {
        let err = AgentName::parse(raw).unwrap_err();
        assert!(matches!(err, WorkspaceError::ReservedName { .. }), "got: {err}");
    }

    #[test]
    fn repo_names_allow_dots_but_not_leading() {
        assert!(RepoName::parse("my.repo").is_ok());
        assert!(RepoName::parse(".hidden").is_err());
        assert!(RepoName::parse("a/b").is_err());
    }

    #[test]
    fn branch_names_allow_slashes() {
        assert!(BranchName::parse("feature/x").is_ok());
        assert!(BranchName::parse("-D").is_err());
        assert!(BranchName::parse("two words").is_err());
    }

    #[test]
    fn serde_rejects_reserved_agent_name() {
        let ok: AgentName = serde_yaml::from_str("a1").expect("deserialize");
        assert_eq!(ok.to_string(), "a1");
        assert!(serde_yaml::from_str::<AgentName>("hub").is_err());
    }

    #[test]
    fn worktree_path_joins_repo_under_work() {
        let name = AgentName::parse("a1").unwrap();
        let paths = AgentPaths {
            name,
            root: PathBuf::from("/agents/a1"),
            work: PathBuf::from("/agents/a1/work"),
            logs: PathBuf::from("/agents/a1/logs"),
            overlay: PathBuf::from("/agents/a1/AGENT.md"),
        };
        let repo = RepoName::parse("demo").unwrap();
        assert_eq!(paths.worktree(&repo), PathBuf::from("/agents/a1/work/demo"));
    }
}
