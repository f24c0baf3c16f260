use super::test_helpers::*;
use stk_cli::config::branches_file;
use stk_cli::stack::{BranchStore, JsonBranchStore, TrackedBranch};

fn tracked(repo_path: &std::path::Path) -> Vec<TrackedBranch> {
    JsonBranchStore::new(branches_file(repo_path)).load().unwrap()
}

fn row<'a>(rows: &'a [TrackedBranch], name: &str) -> &'a TrackedBranch {
    rows.iter()
        .find(|row| row.name == name)
        .unwrap_or_else(|| panic!("'{name}' is not tracked"))
}

/// Trunk advances, the stacked branch drifts, restack reconciles it
#[test]
fn test_drift_and_restack_workflow() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    let s0 = branch_sha(&repo_path, "main");

    assert_cli_success(&run_stk(&["init"], &repo_path), "stk init");
    assert_cli_success(&run_stk(&["create", "feature"], &repo_path), "stk create");
    assert_eq!(current_branch(&repo_path), "feature");
    assert_eq!(row(&tracked(&repo_path), "feature").parent_sha.as_deref(), Some(s0.as_str()));
    commit_file(&repo_path, "feature.txt", "feature\n", "feature work");

    checkout(&repo_path, "main");
    let s1 = commit_file(&repo_path, "main.txt", "main\n", "main advances");
    checkout(&repo_path, "feature");

    let status = run_stk(&["status"], &repo_path);
    assert_cli_success(&status, "stk status");
    assert_output_contains(&status, "needs restack", "status after trunk moved");

    assert_cli_success(&run_stk(&["restack"], &repo_path), "stk restack");

    let rows = tracked(&repo_path);
    assert_eq!(row(&rows, "feature").parent_sha.as_deref(), Some(s1.as_str()));
    assert!(is_ancestor(&repo_path, &s1, "feature"));
    assert_eq!(current_branch(&repo_path), "feature");
    assert!(!repo_path.join(".git").join("STK_OPERATION").exists());

    let status = run_stk(&["status"], &repo_path);
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(!stdout.contains("needs restack"), "still drifted: {stdout}");
}

#[test]
fn test_conflict_continue_via_cli() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    assert_cli_success(&run_stk(&["init"], &repo_path), "stk init");
    assert_cli_success(&run_stk(&["create", "a"], &repo_path), "stk create a");
    commit_file(&repo_path, "shared.txt", "from a\n", "a: shared");
    assert_cli_success(&run_stk(&["create", "b"], &repo_path), "stk create b");
    commit_file(&repo_path, "b.txt", "b\n", "b: file");

    checkout(&repo_path, "main");
    commit_file(&repo_path, "shared.txt", "from main\n", "main: shared");
    checkout(&repo_path, "b");

    let restack = run_stk(&["restack", "main"], &repo_path);
    assert_cli_success(&restack, "stk restack main");
    assert_output_contains(&restack, "stk continue", "conflict guidance");
    assert!(rebase_in_progress(&repo_path));

    let blocked = run_stk(&["create", "c"], &repo_path);
    assert_cli_error_contains(&blocked, "stk create while suspended", "already in progress");

    let status = run_stk(&["status"], &repo_path);
    assert_output_contains(&status, "restack is in progress", "status while suspended");

    std::fs::write(repo_path.join("shared.txt"), "from main\nfrom a\n").unwrap();
    git(&repo_path, &["add", "shared.txt"]);
    assert_cli_success(&run_stk(&["continue"], &repo_path), "stk continue");

    assert!(!rebase_in_progress(&repo_path));
    assert_eq!(current_branch(&repo_path), "b");
    assert!(is_ancestor(&repo_path, "main", "b"));
    assert!(is_ancestor(&repo_path, "a", "b"));
}

#[test]
fn test_abort_via_cli_returns_to_start() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    assert_cli_success(&run_stk(&["init"], &repo_path), "stk init");
    assert_cli_success(&run_stk(&["create", "a"], &repo_path), "stk create a");
    commit_file(&repo_path, "shared.txt", "from a\n", "a: shared");

    checkout(&repo_path, "main");
    commit_file(&repo_path, "shared.txt", "from main\n", "main: shared");
    checkout(&repo_path, "a");
    let before = branch_sha(&repo_path, "a");

    assert_cli_success(&run_stk(&["restack"], &repo_path), "stk restack");
    assert!(rebase_in_progress(&repo_path));

    let abort = run_stk(&["abort"], &repo_path);
    assert_cli_success(&abort, "stk abort");
    assert!(!rebase_in_progress(&repo_path));
    assert_eq!(current_branch(&repo_path), "a");
    assert_eq!(branch_sha(&repo_path, "a"), before);

    let again = run_stk(&["abort"], &repo_path);
    assert_cli_error_contains(&again, "second abort", "No operation in progress");
}

#[test]
fn test_track_rename_move_and_untrack() {
    let (_temp_dir, repo_path) = create_test_stk_repo();
    git(&repo_path, &["branch", "topic"]);
    git(&repo_path, &["branch", "other"]);

    assert_cli_success(&run_stk(&["track", "topic"], &repo_path), "stk track topic");
    assert_cli_success(&run_stk(&["track", "other"], &repo_path), "stk track other");
    let untracked_parent = run_stk(&["track", "topic", "--parent", "ghost"], &repo_path);
    assert!(!untracked_parent.status.success());

    checkout(&repo_path, "topic");
    assert_cli_success(&run_stk(&["create", "child"], &repo_path), "stk create child");

    assert_cli_success(
        &run_stk(&["rename", "topic2", "--branch", "topic"], &repo_path),
        "stk rename",
    );
    let rows = tracked(&repo_path);
    assert_eq!(row(&rows, "child").parent.as_deref(), Some("topic2"));
    assert!(rows.iter().all(|row| row.name != "topic"));

    let orphaning = run_stk(&["untrack", "topic2"], &repo_path);
    assert_cli_error_contains(&orphaning, "untrack with children", "child");

    assert_cli_success(
        &run_stk(&["move", "--onto", "other", "child"], &repo_path),
        "stk move",
    );
    assert_eq!(row(&tracked(&repo_path), "child").parent.as_deref(), Some("other"));
    assert!(is_ancestor(&repo_path, "other", "child"));

    assert_cli_success(&run_stk(&["untrack", "topic2"], &repo_path), "stk untrack");
    assert!(tracked(&repo_path).iter().all(|row| row.name != "topic2"));
}

#[test]
fn test_commands_before_init_give_guidance() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    let output = run_stk(&["status"], &repo_path);
    assert_cli_error_contains(&output, "status before init", "stk init");
}

#[test]
fn test_sync_prunes_deleted_branches() {
    let (_temp_dir, repo_path) = create_test_stk_repo();
    assert_cli_success(&run_stk(&["create", "a"], &repo_path), "stk create a");
    assert_cli_success(&run_stk(&["create", "b"], &repo_path), "stk create b");
    checkout(&repo_path, "main");
    git(&repo_path, &["branch", "-D", "a"]);

    // No remote configured: the pull step warns but pruning still runs
    let sync = run_stk(&["sync"], &repo_path);
    assert_cli_success(&sync, "stk sync");

    let rows = tracked(&repo_path);
    assert!(rows.iter().all(|row| row.name != "a"));
    assert_eq!(row(&rows, "b").parent.as_deref(), Some("main"));
}

#[test]
fn test_status_survives_parent_deleted_in_git() {
    let (_temp_dir, repo_path) = create_test_stk_repo();
    assert_cli_success(&run_stk(&["create", "a"], &repo_path), "stk create a");
    assert_cli_success(&run_stk(&["create", "b"], &repo_path), "stk create b");
    checkout(&repo_path, "main");
    git(&repo_path, &["branch", "-D", "a"]);

    let status = run_stk(&["status"], &repo_path);
    assert_cli_success(&status, "stk status with a deleted parent");
    assert_output_contains(&status, "b (needs restack)", "child of deleted branch");
}
