//! In-memory port implementations for tests.
//!
//! [`FakeMultiplexer`] and [`FakeSecretStore`] keep all state in memory.
//! [`FakeSourceControl`] keeps refs and worktree records in memory but
//! creates real directories (mirror dirs, worktree dirs with a `.git`
//! pointer file) so filesystem checks behave as they would against git.
//! [`RecordingRunner`] stands in for process execution under the adapters.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use agentctl_core::{Multiplexer, SecretStore, SourceControl, WindowId, WindowInfo, WorkspaceError};

use crate::command::{CommandOutput, CommandRunner};

fn tool_err(tool: &str, args: impl Into<String>, stderr: impl Into<String>) -> WorkspaceError {
    WorkspaceError::Tool {
        tool: tool.to_string(),
        args: args.into(),
        stderr: stderr.into(),
    }
}

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

/// [`CommandRunner`] that records every command line and answers from
/// prefix-matched canned responses. Unmatched commands succeed silently.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    rules: Vec<(String, CommandOutput)>,
    calls: RefCell<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for command lines starting with `prefix`.
    pub fn respond(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            CommandOutput {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Fail with `stderr` for command lines starting with `prefix`.
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Every command line run so far, as `program arg arg ...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn answer(&self, program: &str, args: &[&str]) -> CommandOutput {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let out = self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or(CommandOutput {
                success: true,
                ..CommandOutput::default()
            });
        self.calls.borrow_mut().push(line);
        out
    }
}

impl CommandRunner for RecordingRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, WorkspaceError> {
        Ok(self.answer(program, args))
    }

    fn interactive(&self, program: &str, args: &[&str]) -> Result<bool, WorkspaceError> {
        Ok(self.answer(program, args).success)
    }
}

// ---------------------------------------------------------------------------
// FakeMultiplexer
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct FakeSession {
    pub windows: Vec<WindowInfo>,
    pub env: BTreeMap<String, String>,
    pub shell: Option<String>,
}

#[derive(Debug, Default)]
struct MuxState {
    sessions: BTreeMap<String, FakeSession>,
    next_id: u32,
    sent: Vec<(WindowId, String)>,
    attached: Vec<(String, Option<WindowId>)>,
}

impl MuxState {
    fn session_mut(&mut self, session: &str) -> Result<&mut FakeSession, WorkspaceError> {
        self.sessions
            .get_mut(session)
            .ok_or_else(|| tool_err("tmux", format!("-t ={session}"), format!("can't find session: {session}")))
    }

    fn window_mut(&mut self, session: &str, id: &WindowId) -> Result<&mut WindowInfo, WorkspaceError> {
        self.session_mut(session)?
            .windows
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| tool_err("tmux", format!("-t {id}"), format!("can't find window: {id}")))
    }

    fn fresh_id(&mut self) -> WindowId {
        let id = WindowId(format!("@{}", self.next_id));
        self.next_id += 1;
        id
    }
}

/// In-memory terminal multiplexer.
#[derive(Debug, Default)]
pub struct FakeMultiplexer {
    state: RefCell<MuxState>,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window directly, bypassing the orchestrator. Creates the
    /// session when needed.
    pub fn add_window(&self, session: &str, name: &str) -> WindowId {
        let mut st = self.state.borrow_mut();
        let id = st.fresh_id();
        let sess = st.sessions.entry(session.to_string()).or_default();
        let index = sess.windows.iter().map(|w| w.index + 1).max().unwrap_or(0);
        sess.windows.push(WindowInfo {
            id: id.clone(),
            index,
            name: name.to_string(),
            active: false,
            default_path: None,
        });
        id
    }

    pub fn session(&self, session: &str) -> Option<FakeSession> {
        self.state.borrow().sessions.get(session).cloned()
    }

    pub fn window_names(&self, session: &str) -> Vec<String> {
        self.session(session)
            .map(|s| s.windows.iter().map(|w| w.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn window(&self, session: &str, name: &str) -> Option<WindowInfo> {
        self.session(session)?.windows.into_iter().find(|w| w.name == name)
    }

    /// Lines typed into `window`.
    pub fn sent_to(&self, window: &WindowId) -> Vec<String> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter(|(id, _)| id == window)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn attached(&self) -> Vec<(String, Option<WindowId>)> {
        self.state.borrow().attached.clone()
    }
}

impl Multiplexer for FakeMultiplexer {
    fn has_session(&self, session: &str) -> Result<bool, WorkspaceError> {
        Ok(self.state.borrow().sessions.contains_key(session))
    }

    fn new_session(&self, session: &str, first_window: &str, shell: &str) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        if st.sessions.contains_key(session) {
            return Err(tool_err("tmux", format!("new-session -s {session}"), format!("duplicate session: {session}")));
        }
        let id = st.fresh_id();
        st.sessions.insert(
            session.to_string(),
            FakeSession {
                windows: vec![WindowInfo {
                    id,
                    index: 0,
                    name: first_window.to_string(),
                    active: true,
                    default_path: None,
                }],
                env: BTreeMap::new(),
                shell: Some(shell.to_string()),
            },
        );
        Ok(())
    }

    fn configure_session(&self, session: &str, shell: &str) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.session_mut(session)?.shell = Some(shell.to_string());
        Ok(())
    }

    fn set_environment(&self, session: &str, key: &str, value: &str) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.session_mut(session)?
            .env
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, WorkspaceError> {
        Ok(self.session(session).map(|s| s.windows).unwrap_or_default())
    }

    fn new_window(&self, session: &str, name: &str, cwd: &Path, _shell: &str) -> Result<WindowId, WorkspaceError> {
        let mut st = self.state.borrow_mut();
        let id = st.fresh_id();
        let sess = st.session_mut(session)?;
        let index = sess.windows.iter().map(|w| w.index + 1).max().unwrap_or(0);
        for w in &mut sess.windows {
            w.active = false;
        }
        sess.windows.push(WindowInfo {
            id: id.clone(),
            index,
            name: name.to_string(),
            active: true,
            default_path: Some(cwd.to_path_buf()),
        });
        Ok(id)
    }

    fn select_window(&self, session: &str, window: &WindowId) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.window_mut(session, window)?;
        for w in &mut st.session_mut(session)?.windows {
            w.active = &w.id == window;
        }
        Ok(())
    }

    fn rename_window(&self, session: &str, window: &WindowId, name: &str) -> Result<(), WorkspaceError> {
        self.state.borrow_mut().window_mut(session, window)?.name = name.to_string();
        Ok(())
    }

    fn set_default_path(&self, session: &str, window: &WindowId, path: &Path) -> Result<(), WorkspaceError> {
        self.state.borrow_mut().window_mut(session, window)?.default_path = Some(path.to_path_buf());
        Ok(())
    }

    fn kill_window(&self, session: &str, window: &WindowId) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.window_mut(session, window)?;
        st.session_mut(session)?.windows.retain(|w| &w.id != window);
        Ok(())
    }

    fn send_line(&self, session: &str, window: &WindowId, line: &str) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.window_mut(session, window)?;
        st.sent.push((window.clone(), line.to_string()));
        Ok(())
    }

    fn attach(&self, session: &str, window: Option<&WindowId>) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.session_mut(session)?;
        st.attached.push((session.to_string(), window.cloned()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeSourceControl
// ---------------------------------------------------------------------------

/// One mirror as seen by [`FakeSourceControl`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FakeMirror {
    pub url: String,
    pub refs: Vec<String>,
    /// Registered worktree path → branch.
    pub worktrees: BTreeMap<PathBuf, String>,
    pub fetches: usize,
}

#[derive(Debug, Default)]
struct ScmState {
    remotes: BTreeMap<String, Vec<String>>,
    mirrors: BTreeMap<PathBuf, FakeMirror>,
    calls: Vec<String>,
}

impl ScmState {
    fn mirror_mut(&mut self, mirror: &Path) -> Result<&mut FakeMirror, WorkspaceError> {
        self.mirrors
            .get_mut(mirror)
            .ok_or_else(|| tool_err("git", format!("-C {}", mirror.display()), "not a git repository"))
    }

    /// Pruning fetch: `origin/*` follows the remote, local branches stay.
    fn sync_tracking(&mut self, mirror: &Path) -> Result<(), WorkspaceError> {
        let url = self.mirror_mut(mirror)?.url.clone();
        let upstream: Vec<String> = self
            .remotes
            .get(&url)
            .map(|branches| branches.iter().map(|b| format!("{TRACKING_PREFIX}{b}")).collect())
            .unwrap_or_default();
        let m = self.mirror_mut(mirror)?;
        m.refs
            .retain(|r| !r.starts_with(TRACKING_PREFIX) || upstream.contains(r));
        for r in upstream {
            if !m.refs.contains(&r) {
                m.refs.push(r);
            }
        }
        Ok(())
    }
}

const TRACKING_PREFIX: &str = "origin/";

/// In-memory source control backed by real directories.
#[derive(Debug, Default)]
pub struct FakeSourceControl {
    state: RefCell<ScmState>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a remote at `url` holding `branches` (in creation order).
    pub fn with_remote(self, url: &str, branches: &[&str]) -> Self {
        self.set_remote(url, branches);
        self
    }

    /// Replace the branches the remote at `url` holds.
    pub fn set_remote(&self, url: &str, branches: &[&str]) {
        self.state
            .borrow_mut()
            .remotes
            .insert(url.to_string(), branches.iter().map(|b| b.to_string()).collect());
    }

    pub fn mirror(&self, path: &Path) -> Option<FakeMirror> {
        self.state.borrow().mirrors.get(path).cloned()
    }

    /// Operations performed so far, e.g. `clone <url>`, `fetch <mirror>`.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }
}

impl SourceControl for FakeSourceControl {
    fn clone_mirror(&self, url: &str, dest: &Path) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(format!("clone {url}"));
        if !st.remotes.contains_key(url) {
            return Err(tool_err("git", format!("fetch {url}"), "repository not found"));
        }
        std::fs::create_dir_all(dest).map_err(|e| agentctl_core::error::io_err(dest, e))?;
        st.mirrors.insert(
            dest.to_path_buf(),
            FakeMirror {
                url: url.to_string(),
                ..FakeMirror::default()
            },
        );
        st.sync_tracking(dest)
    }

    fn fetch(&self, mirror: &Path) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(format!("fetch {}", mirror.display()));
        st.sync_tracking(mirror)?;
        st.mirror_mut(mirror)?.fetches += 1;
        Ok(())
    }

    fn ref_exists(&self, mirror: &Path, refname: &str) -> Result<bool, WorkspaceError> {
        let mut st = self.state.borrow_mut();
        Ok(st.mirror_mut(mirror)?.refs.iter().any(|r| r == refname))
    }

    fn add_worktree(&self, mirror: &Path, path: &Path, branch: &str, base: &str) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(format!("worktree add -B {branch} {} {base}", path.display()));
        let m = st.mirror_mut(mirror)?;
        if !m.refs.iter().any(|r| r == base) {
            return Err(tool_err("git", "worktree add", format!("invalid reference: {base}")));
        }
        if path.join(".git").exists() {
            return Err(tool_err("git", "worktree add", format!("'{}' already exists", path.display())));
        }
        std::fs::create_dir_all(path).map_err(|e| agentctl_core::error::io_err(path, e))?;
        let pointer = format!("gitdir: {}/worktrees/{branch}\n", mirror.display());
        std::fs::write(path.join(".git"), pointer).map_err(|e| agentctl_core::error::io_err(path, e))?;
        if !m.refs.iter().any(|r| r == branch) {
            m.refs.push(branch.to_string());
        }
        m.worktrees.insert(path.to_path_buf(), branch.to_string());
        Ok(())
    }

    fn prune_worktrees(&self, mirror: &Path) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(format!("prune {}", mirror.display()));
        st.mirror_mut(mirror)?
            .worktrees
            .retain(|path, _| path.join(".git").exists());
        Ok(())
    }

    fn repair_worktrees(&self, mirror: &Path, paths: &[PathBuf]) -> Result<(), WorkspaceError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(format!("repair {}", mirror.display()));
        let m = st.mirror_mut(mirror)?;
        for new_path in paths {
            if m.worktrees.contains_key(new_path) {
                continue;
            }
            let stale = m
                .worktrees
                .keys()
                .find(|old| !old.exists() && old.file_name() == new_path.file_name())
                .cloned();
            if let Some(old) = stale {
                if let Some(branch) = m.worktrees.remove(&old) {
                    m.worktrees.insert(new_path.clone(), branch);
                }
            }
        }
        Ok(())
    }

    fn current_branch(&self, worktree: &Path) -> Result<Option<String>, WorkspaceError> {
        self.state
            .borrow()
            .mirrors
            .values()
            .find_map(|m| m.worktrees.get(worktree).cloned())
            .map(Some)
            .ok_or_else(|| tool_err("git", format!("-C {} rev-parse", worktree.display()), "not a git repository"))
    }
}

// ---------------------------------------------------------------------------
// FakeSecretStore
// ---------------------------------------------------------------------------

/// In-memory secret and parameter store. Lookups record `kind id@region`.
#[derive(Debug, Default)]
pub struct FakeSecretStore {
    secrets: BTreeMap<String, String>,
    parameters: BTreeMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl FakeSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, id: &str, value: &str) -> Self {
        self.secrets.insert(id.to_string(), value.to_string());
        self
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.insert(name.to_string(), value.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SecretStore for FakeSecretStore {
    fn secret(&self, id: &str, region: &str) -> Result<String, WorkspaceError> {
        self.calls.borrow_mut().push(format!("secret {id}@{region}"));
        self.secrets.get(id).cloned().ok_or_else(|| {
            tool_err("aws", format!("secretsmanager get-secret-value --secret-id {id}"), "ResourceNotFoundException")
        })
    }

    fn parameter(&self, name: &str, region: &str) -> Result<String, WorkspaceError> {
        self.calls.borrow_mut().push(format!("parameter {name}@{region}"));
        self.parameters.get(name).cloned().ok_or_else(|| {
            tool_err("aws", format!("ssm get-parameter --name {name}"), "ParameterNotFound")
        })
    }
}
