//! `sync-config`: pull the shared SSH key and repo mapping from the remote
//! secret store.
//!
//! For config name `<name>` the derived keys are:
//!
//! - secret `agentctl/<name>/ssh-key` → `<home>/.ssh/agentctl_<name>` (0600)
//! - parameter `/agentctl/<name>/repos` → the repo mapping document
//!
//! The name is remembered in `<config>/last-config` for the next run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use agentctl_core::error::io_err;
use agentctl_core::layout::DEFAULT_REGION;
use agentctl_core::{Layout, RepoMap, SecretStore, WorkspaceError};
use agentctl_sync::{atomic_write, atomic_write_mode};

use crate::error::OrchestratorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteConfigReport {
    pub name: String,
    pub region: String,
    pub key_path: PathBuf,
    pub repos_file: PathBuf,
    pub repo_count: usize,
}

pub fn secret_id(name: &str) -> String {
    format!("agentctl/{name}/ssh-key")
}

pub fn parameter_name(name: &str) -> String {
    format!("/agentctl/{name}/repos")
}

/// Region precedence: flag, `AWS_REGION`, `config.yaml`, default.
pub fn resolve_region(flag: Option<&str>, env: Option<String>, layout: &Layout) -> String {
    flag.map(str::to_string)
        .or(env.filter(|r| !r.is_empty()))
        .or_else(|| layout.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// The explicit name, else the remembered one.
pub fn resolve_name(flag: Option<&str>, layout: &Layout) -> Result<String, WorkspaceError> {
    let name = match flag {
        Some(name) => name.to_string(),
        None => read_last_config(&layout.last_config_file())?.ok_or_else(|| {
            WorkspaceError::Usage(format!(
                "no config name given and none remembered in {}",
                layout.last_config_file().display()
            ))
        })?,
    };
    if name.is_empty()
        || name.starts_with('-')
        || name.chars().any(|c| c == '/' || c.is_whitespace())
    {
        return Err(WorkspaceError::InvalidName {
            what: "config",
            name,
            reason: "must be non-empty without '/' or whitespace",
        });
    }
    Ok(name)
}

fn read_last_config(path: &Path) -> Result<Option<String>, WorkspaceError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Fetch both values first, then write; a failed lookup leaves every local
/// file as it was.
pub fn sync_config(
    layout: &Layout,
    store: &dyn SecretStore,
    name: &str,
    region: &str,
) -> Result<RemoteConfigReport, OrchestratorError> {
    let mut key = store.secret(&secret_id(name), region)?;
    let mut repos = store.parameter(&parameter_name(name), region)?;
    for value in [&mut key, &mut repos] {
        if !value.ends_with('\n') {
            value.push('\n');
        }
    }

    create_private_dir(&layout.ssh_dir)?;
    let key_path = layout.ssh_dir.join(format!("agentctl_{name}"));
    atomic_write_mode(&key_path, &key, Some(0o600), false)?;
    atomic_write(&layout.repos_file, &repos, false)?;
    atomic_write(&layout.last_config_file(), &format!("{name}\n"), false)?;

    let repo_count = RepoMap::parse(&layout.repos_file, &repos).names().count();
    tracing::info!(name, region, repos = repo_count, "synced remote config");
    Ok(RemoteConfigReport {
        name: name.to_string(),
        region: region.to_string(),
        key_path,
        repos_file: layout.repos_file.clone(),
        repo_count,
    })
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<(), WorkspaceError> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| io_err(dir, e))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}
