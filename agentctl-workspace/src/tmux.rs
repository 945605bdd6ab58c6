//! [`Multiplexer`] adapter for tmux.
//!
//! Windows are addressed by their stable `#{window_id}` (`@N`) once known;
//! sessions by exact name (`=name`) so `hub` never prefix-matches `hub2`.
//! The workspace path of each window is kept in the user option
//! `@agentctl_path`, which the session key bindings read when opening new
//! panes.

use std::path::{Path, PathBuf};

use agentctl_core::{Multiplexer, WindowId, WindowInfo, WorkspaceError};

use crate::command::{run_checked, CommandRunner};

const TMUX: &str = "tmux";
const PATH_OPTION: &str = "@agentctl_path";
const PANE_PATH: &str = "#{?@agentctl_path,#{@agentctl_path},#{pane_current_path}}";
const WINDOW_FORMAT: &str =
    "#{window_id}\t#{window_index}\t#{window_name}\t#{window_active}\t#{@agentctl_path}";

pub struct Tmux<R: CommandRunner> {
    runner: R,
    /// `$TMUX` was set: attach by switching the current client.
    inside: bool,
}

impl<R: CommandRunner> Tmux<R> {
    /// Adapter for the tmux server of the current environment.
    pub fn new(runner: R) -> Self {
        let inside = std::env::var_os("TMUX").is_some_and(|v| !v.is_empty());
        Self { runner, inside }
    }

    pub fn with_client(runner: R, inside: bool) -> Self {
        Self { runner, inside }
    }

    fn run(&self, args: &[&str]) -> Result<String, WorkspaceError> {
        run_checked(&self.runner, TMUX, args)
    }

    fn set_window_option(&self, window: &WindowId, key: &str, value: &str) -> Result<(), WorkspaceError> {
        self.run(&["set-option", "-w", "-t", &window.0, key, value]).map(drop)
    }
}

fn session_target(session: &str) -> String {
    format!("={session}")
}

fn login_command(shell: &str) -> String {
    format!("{shell} -l")
}

/// Parse one line of [`WINDOW_FORMAT`] output.
fn parse_window_line(line: &str) -> Option<WindowInfo> {
    let mut cols = line.splitn(5, '\t');
    let id = cols.next()?.trim();
    let index = cols.next()?.trim().parse().ok()?;
    let name = cols.next()?.to_string();
    let active = cols.next()?.trim() == "1";
    let path = cols.next().unwrap_or("").trim();
    if !id.starts_with('@') {
        return None;
    }
    Some(WindowInfo {
        id: WindowId(id.to_string()),
        index,
        name,
        active,
        default_path: (!path.is_empty()).then(|| PathBuf::from(path)),
    })
}

impl<R: CommandRunner> Multiplexer for Tmux<R> {
    fn has_session(&self, session: &str) -> Result<bool, WorkspaceError> {
        // No tmux binary means no session to report on.
        match self
            .runner
            .output(TMUX, &["has-session", "-t", &session_target(session)])
        {
            Ok(out) => Ok(out.success),
            Err(err) => {
                tracing::debug!(error = %err, "tmux unavailable");
                Ok(false)
            }
        }
    }

    fn new_session(&self, session: &str, first_window: &str, shell: &str) -> Result<(), WorkspaceError> {
        self.run(&[
            "new-session",
            "-d",
            "-s",
            session,
            "-n",
            first_window,
            &login_command(shell),
        ])
        .map(drop)
    }

    fn configure_session(&self, session: &str, shell: &str) -> Result<(), WorkspaceError> {
        let target = session_target(session);
        self.run(&["set-option", "-t", &target, "default-shell", shell])?;
        self.run(&["set-option", "-t", &target, "default-command", &login_command(shell)])?;
        self.run(&["bind-key", "c", "new-window", "-c", PANE_PATH])?;
        self.run(&["bind-key", "\"", "split-window", "-v", "-c", PANE_PATH])?;
        self.run(&["bind-key", "%", "split-window", "-h", "-c", PANE_PATH])?;
        Ok(())
    }

    fn set_environment(&self, session: &str, key: &str, value: &str) -> Result<(), WorkspaceError> {
        self.run(&["set-environment", "-t", &session_target(session), key, value])
            .map(drop)
    }

    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, WorkspaceError> {
        if !self.has_session(session)? {
            return Ok(vec![]);
        }
        let out = self.run(&["list-windows", "-t", &session_target(session), "-F", WINDOW_FORMAT])?;
        Ok(out.lines().filter_map(parse_window_line).collect())
    }

    fn new_window(&self, session: &str, name: &str, cwd: &Path, shell: &str) -> Result<WindowId, WorkspaceError> {
        let target = format!("={session}:");
        let cwd = cwd.display().to_string();
        let out = self.run(&[
            "new-window",
            "-P",
            "-F",
            "#{window_id}",
            "-t",
            &target,
            "-n",
            name,
            "-c",
            &cwd,
            &login_command(shell),
        ])?;
        let id = out.trim();
        if id.is_empty() {
            return Err(WorkspaceError::Tool {
                tool: TMUX.to_string(),
                args: format!("new-window -n {name}"),
                stderr: "no window id printed".to_string(),
            });
        }
        Ok(WindowId(id.to_string()))
    }

    fn select_window(&self, _session: &str, window: &WindowId) -> Result<(), WorkspaceError> {
        self.run(&["select-window", "-t", &window.0]).map(drop)
    }

    fn rename_window(&self, _session: &str, window: &WindowId, name: &str) -> Result<(), WorkspaceError> {
        self.run(&["rename-window", "-t", &window.0, name])?;
        self.set_window_option(window, "automatic-rename", "off")?;
        self.set_window_option(window, "allow-rename", "off")
    }

    fn set_default_path(&self, _session: &str, window: &WindowId, path: &Path) -> Result<(), WorkspaceError> {
        self.set_window_option(window, PATH_OPTION, &path.display().to_string())
    }

    fn kill_window(&self, _session: &str, window: &WindowId) -> Result<(), WorkspaceError> {
        self.run(&["kill-window", "-t", &window.0]).map(drop)
    }

    fn send_line(&self, _session: &str, window: &WindowId, line: &str) -> Result<(), WorkspaceError> {
        self.run(&["send-keys", "-t", &window.0, "-l", line])?;
        self.run(&["send-keys", "-t", &window.0, "Enter"]).map(drop)
    }

    fn attach(&self, session: &str, window: Option<&WindowId>) -> Result<(), WorkspaceError> {
        if let Some(window) = window {
            self.select_window(session, window)?;
        }
        let target = match window {
            Some(w) => w.0.clone(),
            None => session_target(session),
        };
        let args: [&str; 3] = if self.inside {
            ["switch-client", "-t", &target]
        } else {
            ["attach-session", "-t", &target]
        };
        if self.runner.interactive(TMUX, &args)? {
            Ok(())
        } else {
            Err(WorkspaceError::Tool {
                tool: TMUX.to_string(),
                args: args.join(" "),
                stderr: "exited with failure".to_string(),
            })
        }
    }
}
