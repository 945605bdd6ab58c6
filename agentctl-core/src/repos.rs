//! Repo mapping document: one repository per line, `<name> <clone-url>`.
//!
//! Lines starting with `#` (after leading whitespace) and lines with fewer
//! than two whitespace-delimited columns are ignored; extra columns are
//! ignored too. The first entry for a name wins.

use std::path::{Path, PathBuf};

use crate::error::{io_err, WorkspaceError};
use crate::types::RepoName;

/// Parsed repo name → clone URL mapping, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMap {
    path: PathBuf,
    entries: Vec<(RepoName, String)>,
}

impl RepoMap {
    /// Read and parse the mapping at `path`.
    ///
    /// Returns [`WorkspaceError::RepoMapMissing`] when the file is absent.
    pub fn load(path: &Path) -> Result<Self, WorkspaceError> {
        if !path.exists() {
            return Err(WorkspaceError::RepoMapMissing {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Self::parse(path, &contents))
    }

    /// Parse `contents`; `path` is only used in error messages.
    pub fn parse(path: &Path, contents: &str) -> Self {
        let mut entries: Vec<(RepoName, String)> = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                continue;
            }
            let mut cols = trimmed.split_whitespace();
            let (Some(name), Some(url)) = (cols.next(), cols.next()) else {
                continue;
            };
            let name = match RepoName::parse(name) {
                Ok(name) => name,
                Err(err) => {
                    tracing::warn!(line = lineno + 1, error = %err, "skipping repo mapping line");
                    continue;
                }
            };
            if entries.iter().any(|(n, _)| *n == name) {
                continue;
            }
            entries.push((name, url.to_string()));
        }
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> impl Iterator<Item = &RepoName> {
        self.entries.iter().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone URL for `repo`, or [`WorkspaceError::UnknownRepo`].
    pub fn resolve(&self, repo: &RepoName) -> Result<&str, WorkspaceError> {
        self.entries
            .iter()
            .find(|(n, _)| n == repo)
            .map(|(_, url)| url.as_str())
            .ok_or_else(|| WorkspaceError::UnknownRepo {
                name: repo.to_string(),
                path: self.path.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# name url
demo git@host:org/demo.git
  # indented comment
lonely
api   https://host/org/api.git   extra
demo git@host:org/other.git
";

    fn repo(name: &str) -> RepoName {
        RepoName::parse(name).unwrap()
    }

    #[test]
    fn parses_names_in_file_order() {
        let map = RepoMap::parse(Path::new("repos.txt"), SAMPLE);
        let names: Vec<&str> = map.names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["demo", "api"]);
    }

    #[test]
    fn first_entry_wins_and_extra_columns_ignored() {
        let map = RepoMap::parse(Path::new("repos.txt"), SAMPLE);
        assert_eq!(map.resolve(&repo("demo")).unwrap(), "git@host:org/demo.git");
        assert_eq!(map.resolve(&repo("api")).unwrap(), "https://host/org/api.git");
    }

    #[test]
    fn unknown_repo_names_the_mapping_file() {
        let map = RepoMap::parse(Path::new("/cfg/repos.txt"), SAMPLE);
        let err = map.resolve(&repo("nope")).unwrap_err();
        assert!(matches!(err, WorkspaceError::UnknownRepo { .. }));
        assert!(err.to_string().contains("/cfg/repos.txt"));
    }

    #[test]
    fn missing_file_is_repo_map_missing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = RepoMap::load(&tmp.path().join("repos.txt")).unwrap_err();
        assert!(matches!(err, WorkspaceError::RepoMapMissing { .. }));
    }
}
