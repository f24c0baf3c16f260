//! Shared setup for tests that drive real git repositories.
//!
//! Helpers panic with git's stderr on failure so a broken fixture is
//! reported where it happened.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Run a git command in `repo_path` and return trimmed stdout
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .env("GIT_EDITOR", "true")
        .output()
        .expect("Git command should run");

    if !output.status.success() {
        panic!(
            "Git command failed: git {}\nStderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create test git repository on `main` with one commit
pub fn create_test_git_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    let git_commands = [
        vec!["init"],
        vec!["config", "user.name", "Test User"],
        vec!["config", "user.email", "test@example.com"],
        vec!["config", "core.autocrlf", "false"],
        vec!["config", "commit.gpgsign", "false"],
    ];
    for cmd_args in &git_commands {
        git(&repo_path, cmd_args);
    }

    std::fs::write(repo_path.join("README.md"), "# Test Repository\n").unwrap();
    git(&repo_path, &["add", "."]);
    git(&repo_path, &["commit", "-m", "Initial commit"]);
    git(&repo_path, &["branch", "-M", "main"]);

    (temp_dir, repo_path)
}

/// Create test git repository initialized for stk with `main` tracked
#[allow(dead_code)]
pub fn create_test_stk_repo() -> (TempDir, PathBuf) {
    let (temp_dir, repo_path) = create_test_git_repo();
    stk_cli::cli::commands::init::initialize(&repo_path, None, None, false)
        .expect("stk init should succeed");
    (temp_dir, repo_path)
}

/// Write `content` to `file` and commit it on the current branch
#[allow(dead_code)]
pub fn commit_file(repo_path: &Path, file: &str, content: &str, message: &str) -> String {
    std::fs::write(repo_path.join(file), content).unwrap();
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
    git(repo_path, &["rev-parse", "HEAD"])
}

#[allow(dead_code)]
pub fn checkout(repo_path: &Path, branch: &str) {
    git(repo_path, &["checkout", "-q", branch]);
}

#[allow(dead_code)]
pub fn current_branch(repo_path: &Path) -> String {
    git(repo_path, &["rev-parse", "--abbrev-ref", "HEAD"])
}

#[allow(dead_code)]
pub fn branch_sha(repo_path: &Path, branch: &str) -> String {
    git(repo_path, &["rev-parse", branch])
}

/// True when `ancestor` is reachable from `branch`
#[allow(dead_code)]
pub fn is_ancestor(repo_path: &Path, ancestor: &str, branch: &str) -> bool {
    Command::new("git")
        .args(["merge-base", "--is-ancestor", ancestor, branch])
        .current_dir(repo_path)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[allow(dead_code)]
pub fn rebase_in_progress(repo_path: &Path) -> bool {
    let git_dir = repo_path.join(".git");
    git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists()
}

/// Run the stk binary built for this test run
#[allow(dead_code)]
pub fn run_stk(args: &[&str], repo_path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stk"))
        .args(args)
        .arg("--no-color")
        .current_dir(repo_path)
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute stk")
}

/// Assert CLI command succeeds with helpful error messages
#[allow(dead_code)]
pub fn assert_cli_success(output: &Output, operation: &str) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!(
            "{operation} failed:\nExit code: {}\nStderr: {stderr}\nStdout: {stdout}",
            output.status.code().unwrap_or(-1)
        );
    }
}

/// Assert CLI command fails with specific error pattern
#[allow(dead_code)]
pub fn assert_cli_error_contains(output: &Output, operation: &str, expected_error: &str) {
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!("{operation} unexpectedly succeeded. Stdout: {stdout}");
    }
    assert_output_contains(output, expected_error, operation);
}

/// Check if CLI command output contains expected content
#[allow(dead_code)]
pub fn assert_output_contains(output: &Output, expected_content: &str, context: &str) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stderr.contains(expected_content) || stdout.contains(expected_content),
        "{context}: Expected to find '{expected_content}' in output.\nStderr: {stderr}\nStdout: {stdout}"
    );
}

/// Commit subjects reachable from `range`'s tip but not its base, newest first
#[allow(dead_code)]
pub fn commit_subjects(repo_path: &Path, range: &str) -> Vec<String> {
    git(repo_path, &["log", "--format=%s", range])
        .lines()
        .map(str::to_string)
        .collect()
}

/// Files in the tree at `branch`'s tip
#[allow(dead_code)]
pub fn files_on(repo_path: &Path, branch: &str) -> Vec<String> {
    git(repo_path, &["ls-tree", "--name-only", branch])
        .lines()
        .map(str::to_string)
        .collect()
}
