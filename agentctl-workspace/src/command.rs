//! Process execution behind the real adapters.
//!
//! Adapters never spawn processes directly; they go through a
//! [`CommandRunner`] so tests can substitute a recording double.

use std::process::{Command, Stdio};

use agentctl_core::WorkspaceError;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Generic command execution.
pub trait CommandRunner {
    /// Run `program` with captured stdout/stderr. A nonzero exit is reported
    /// through [`CommandOutput::success`], not as an error.
    fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, WorkspaceError>;

    /// Run `program` with inherited stdio (interactive pass-through).
    /// Returns whether it exited successfully.
    fn interactive(&self, program: &str, args: &[&str]) -> Result<bool, WorkspaceError>;
}

/// Production runner backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, WorkspaceError> {
        tracing::debug!(program, args = %args.join(" "), "running");
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_failed(program, args, &e))?;
        Ok(CommandOutput {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn interactive(&self, program: &str, args: &[&str]) -> Result<bool, WorkspaceError> {
        tracing::debug!(program, args = %args.join(" "), "running interactively");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| spawn_failed(program, args, &e))?;
        Ok(status.success())
    }
}

fn spawn_failed(program: &str, args: &[&str], err: &std::io::Error) -> WorkspaceError {
    WorkspaceError::Tool {
        tool: program.to_string(),
        args: args.join(" "),
        stderr: format!("failed to spawn: {err}"),
    }
}

/// Run and require success; returns stdout.
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<String, WorkspaceError> {
    let out = runner.output(program, args)?;
    if out.success {
        Ok(out.stdout)
    } else {
        Err(WorkspaceError::Tool {
            tool: program.to_string(),
            args: args.join(" "),
            stderr: out.stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_tool_error() {
        let err = SystemRunner
            .output("agentctl-definitely-not-a-binary", &["x"])
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Tool { .. }), "got: {err}");
    }

    #[test]
    #[cfg(unix)]
    fn run_checked_reports_stderr() {
        let err = run_checked(&SystemRunner, "sh", &["-c", "echo boom >&2; exit 3"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`sh -c"), "got: {msg}");
        assert!(msg.ends_with("boom"), "got: {msg}");
    }

    #[test]
    #[cfg(unix)]
    fn run_checked_returns_stdout() {
        let out = run_checked(&SystemRunner, "sh", &["-c", "printf hello"]).unwrap();
        assert_eq!(out, "hello");
    }
}
