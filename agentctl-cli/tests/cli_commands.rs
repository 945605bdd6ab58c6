use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn agentctl(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("agentctl"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("AGENTCTL_SESSION", "agentctl-test-session")
        .env_remove("AGENTCTL_AGENTS_DIR")
        .env_remove("AGENTCTL_MIRRORS_DIR")
        .env_remove("AGENTCTL_CONFIG_DIR")
        .env_remove("AGENTCTL_LOG")
        .env_remove("AWS_REGION")
        .env_remove("TMUX")
        .env("NO_COLOR", "1");
    cmd
}

/// `assert_cmd::Command` wrapper for tests that feed stdin.
fn with_stdin(home: &Path) -> assert_cmd::Command {
    assert_cmd::Command::from_std(agentctl(home))
}

fn config_dir(home: &Path) -> std::path::PathBuf {
    home.join(".config").join("agentctl")
}

fn create(home: &Path, name: &str) {
    agentctl(home).args(["create-agent", name]).assert().success();
}

#[test]
fn list_agents_is_empty_on_a_fresh_host() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .arg("list-agents")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn create_agent_then_list() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a1");
    create(home.path(), "a1");

    let overlay = home.path().join("agents/a1/AGENT.md");
    assert!(fs::read_to_string(overlay).unwrap().starts_with("# Agent: a1"));
    agentctl(home.path())
        .arg("list-agents")
        .assert()
        .success()
        .stdout("a1\n");
}

#[test]
fn create_agent_without_name_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .arg("create-agent")
        .assert()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn list_repos_requires_mapping() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .arg("list-repos")
        .assert()
        .failure()
        .stderr(contains("repo mapping not found"));

    fs::create_dir_all(config_dir(home.path())).unwrap();
    fs::write(
        config_dir(home.path()).join("repos.txt"),
        "# shared repos\ndemo git@host:org/demo.git\n\napi git@host:org/api.git\n",
    )
    .unwrap();
    agentctl(home.path())
        .arg("list-repos")
        .assert()
        .success()
        .stdout("demo\napi\n");
}

#[test]
fn reserved_names_are_refused() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .args(["delete", "hub", "--force"])
        .assert()
        .failure()
        .stderr(contains("reserved"));
    agentctl(home.path())
        .args(["rename", "ctrl", "x"])
        .assert()
        .failure()
        .stderr(contains("reserved"));
    assert!(!home.path().join("agents").exists());
}

#[test]
fn delete_without_matching_confirmation_keeps_directory() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a1");

    with_stdin(home.path())
        .args(["delete", "a1"])
        .write_stdin("yes\n")
        .assert()
        .failure()
        .stderr(contains("cancelled"));
    with_stdin(home.path())
        .args(["delete", "a1"])
        .write_stdin("")
        .assert()
        .failure();
    assert!(home.path().join("agents/a1").is_dir());

    with_stdin(home.path())
        .args(["delete", "a1"])
        .write_stdin("a1\n")
        .assert()
        .success();
    assert!(!home.path().join("agents/a1").exists());
}

#[test]
fn forced_delete_removes_directory() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a1");
    agentctl(home.path())
        .args(["delete", "a1", "--force"])
        .assert()
        .success()
        .stdout(contains("deleted"));
    assert!(!home.path().join("agents/a1").exists());
}

#[test]
fn rename_onto_existing_agent_fails_without_changes() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a");
    create(home.path(), "b");
    fs::write(home.path().join("agents/a/AGENT.md"), "# mine\n").unwrap();

    agentctl(home.path())
        .args(["rename", "a", "b"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
    assert_eq!(
        fs::read_to_string(home.path().join("agents/a/AGENT.md")).unwrap(),
        "# mine\n"
    );
    assert!(home.path().join("agents/b").is_dir());
}

#[test]
fn rename_moves_directory_and_warns_about_missing_window() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a");
    agentctl(home.path())
        .args(["rename", "a", "z"])
        .assert()
        .success()
        .stderr(contains("no workspace window"));
    assert!(home.path().join("agents/z/AGENT.md").is_file());
    assert!(!home.path().join("agents/a").exists());
}

#[test]
fn worktree_for_unknown_repo_fails() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(config_dir(home.path())).unwrap();
    fs::write(config_dir(home.path()).join("repos.txt"), "demo git@host:org/demo.git\n").unwrap();

    agentctl(home.path())
        .args(["worktree", "a1", "nope", "feature-x"])
        .assert()
        .failure()
        .stderr(contains("unknown repo 'nope'"));
    assert!(!home.path().join(".agentctl/mirrors/nope.git").exists());
}

#[test]
fn worktree_help_documents_branch_reset() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .args(["worktree", "--help"])
        .assert()
        .success()
        .stdout(contains("force-reset"));
}

#[test]
fn refresh_context_updates_worktrees() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a1");
    let tree = home.path().join("agents/a1/work/demo");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join(".git"), "gitdir: /elsewhere\n").unwrap();

    agentctl(home.path())
        .arg("refresh-context")
        .assert()
        .success()
        .stdout(contains("0 worktree(s) updated"))
        .stderr(contains("skipped"));

    fs::create_dir_all(config_dir(home.path())).unwrap();
    fs::write(config_dir(home.path()).join("CONTEXT.md"), "# rules\n").unwrap();
    agentctl(home.path())
        .args(["refresh-context", "--agent", "a1", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("+++ b/CLAUDE.md"));
    assert!(!tree.join("CLAUDE.md").exists());

    agentctl(home.path())
        .args(["refresh-context", "--agent", "a1"])
        .assert()
        .success()
        .stdout(contains("1 worktree(s) updated (3 file(s) changed)"));
    let claude = fs::read_to_string(tree.join("CLAUDE.md")).unwrap();
    assert_eq!(claude, fs::read_to_string(tree.join("GEMINI.md")).unwrap());
    assert!(claude.contains("# rules"));
}

#[test]
fn refresh_context_for_unknown_agent_fails() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .args(["refresh-context", "--agent", "ghost"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn sync_config_without_name_fails() {
    let home = TempDir::new().unwrap();
    agentctl(home.path())
        .arg("sync-config")
        .assert()
        .failure()
        .stderr(contains("no config name"));
}

#[test]
fn ps_json_reports_agents() {
    let home = TempDir::new().unwrap();
    create(home.path(), "a1");
    let out = agentctl(home.path()).args(["ps", "--json"]).output().unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["running"], false);
    assert_eq!(json["agents"][0]["name"], "a1");
    assert_eq!(json["session"], "agentctl-test-session");
}
