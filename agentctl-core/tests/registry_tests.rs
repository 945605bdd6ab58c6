//! Agent registry idempotence, rename-conflict and reserved-name tests.

use assert_fs::prelude::*;
use predicates::prelude::*;

use agentctl_core::{AgentName, AgentRegistry, Layout, RepoMap, WorkspaceError};

fn agent(name: &str) -> AgentName {
    AgentName::parse(name).expect("agent name")
}

// ---------------------------------------------------------------------------
// 1. Idempotence
// ---------------------------------------------------------------------------

#[test]
fn ensure_twice_yields_identical_state() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = AgentRegistry::new(home.path().join("agents"));

    let first = registry.ensure(&agent("a1"), "# overlay v1\n").expect("first");
    let mtime_before = std::fs::metadata(&first.overlay).unwrap().modified().unwrap();

    let second = registry.ensure(&agent("a1"), "# overlay v2\n").expect("second");
    assert_eq!(first, second);

    home.child("agents/a1/AGENT.md")
        .assert(predicate::str::diff("# overlay v1\n"));
    home.child("agents/a1/work").assert(predicate::path::is_dir());
    home.child("agents/a1/logs").assert(predicate::path::is_dir());

    let mtime_after = std::fs::metadata(&second.overlay).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after, "overlay must not be rewritten");
}

// ---------------------------------------------------------------------------
// 2. Rename conflict
// ---------------------------------------------------------------------------

#[test]
fn rename_conflict_leaves_both_agents_untouched() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let registry = AgentRegistry::new(home.path());
    registry.ensure(&agent("a"), "A\n").unwrap();
    registry.ensure(&agent("b"), "B\n").unwrap();
    home.child("a/work/demo/file.txt").write_str("a's work").unwrap();

    let err = registry.rename(&agent("a"), &agent("b")).unwrap_err();
    assert!(matches!(err, WorkspaceError::AgentExists { .. }), "got: {err}");

    home.child("a/AGENT.md").assert("A\n");
    home.child("a/work/demo/file.txt").assert("a's work");
    home.child("b/AGENT.md").assert("B\n");
    home.child("b/work/demo").assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 3. Reserved names never reach the filesystem
// ---------------------------------------------------------------------------

#[test]
fn reserved_names_are_rejected_before_any_io() {
    for name in ["hub", "ctrl"] {
        let err = AgentName::parse(name).unwrap_err();
        assert!(matches!(err, WorkspaceError::ReservedName { .. }), "got: {err}");
    }
}

// ---------------------------------------------------------------------------
// 4. Layout + repo mapping
// ---------------------------------------------------------------------------

#[test]
fn repo_map_loads_from_layout_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".config/agentctl/repos.txt")
        .write_str("demo git@host:org/demo.git\n")
        .unwrap();

    let layout = Layout::load_at(home.path(), None).expect("layout");
    let map = RepoMap::load(&layout.repos_file).expect("map");
    let names: Vec<String> = map.names().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["demo"]);
}
