//! [`SourceControl`] adapter for the `git` CLI.

use std::path::{Path, PathBuf};

use agentctl_core::{SourceControl, WorkspaceError};

use crate::command::{run_checked, CommandRunner};

const GIT: &str = "git";

pub struct Git<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Git<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// `git -C <dir> <args...>`
    fn in_dir(&self, dir: &Path, args: &[&str]) -> Result<String, WorkspaceError> {
        let dir = dir.display().to_string();
        let mut full = vec!["-C", dir.as_str()];
        full.extend_from_slice(args);
        run_checked(&self.runner, GIT, &full)
    }
}

impl<R: CommandRunner> SourceControl for Git<R> {
    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<(), WorkspaceError> {
        let dir = dest.display().to_string();
        run_checked(&self.runner, GIT, &["init", "--bare", "--quiet", &dir])?;
        // `remote add` maps refs/heads/* onto refs/remotes/origin/*, so a
        // pruning fetch never deletes the branches worktrees sit on.
        self.in_dir(dest, &["remote", "add", "origin", url])?;
        self.fetch(dest)
    }

    fn fetch(&self, mirror: &Path) -> Result<(), WorkspaceError> {
        self.in_dir(mirror, &["fetch", "--prune", "origin"]).map(drop)
    }

    fn ref_exists(&self, mirror: &Path, refname: &str) -> Result<bool, WorkspaceError> {
        let dir = mirror.display().to_string();
        let spec = format!("{refname}^{{commit}}");
        let out = self.runner.output(
            GIT,
            &["-C", &dir, "rev-parse", "--verify", "--quiet", &spec],
        )?;
        Ok(out.success)
    }

    fn add_worktree(&self, mirror: &Path, path: &Path, branch: &str, base: &str) -> Result<(), WorkspaceError> {
        let path = path.display().to_string();
        self.in_dir(mirror, &["worktree", "add", "-B", branch, &path, base])
            .map(drop)
    }

    fn prune_worktrees(&self, mirror: &Path) -> Result<(), WorkspaceError> {
        self.in_dir(mirror, &["worktree", "prune"]).map(drop)
    }

    fn repair_worktrees(&self, mirror: &Path, paths: &[PathBuf]) -> Result<(), WorkspaceError> {
        let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let mut args = vec!["worktree", "repair"];
        args.extend(paths.iter().map(String::as_str));
        self.in_dir(mirror, &args).map(drop)
    }

    fn current_branch(&self, worktree: &Path) -> Result<Option<String>, WorkspaceError> {
        let out = self.in_dir(worktree, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = out.trim();
        Ok((!branch.is_empty() && branch != "HEAD").then(|| branch.to_string()))
    }
}
