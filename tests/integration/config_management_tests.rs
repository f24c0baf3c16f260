use super::test_helpers::*;
use std::fs;
use stk_cli::config::{config_file, load_settings, Settings};

/// Test config file corruption is reported, not silently replaced
#[test]
fn test_config_corruption_is_reported() {
    let (_temp_dir, repo_path) = create_test_stk_repo();
    fs::write(config_file(&repo_path), "{ invalid json }").unwrap();

    let output = run_stk(&["status"], &repo_path);
    assert_cli_error_contains(&output, "status with corrupt config", "parse");
}

#[test]
fn test_config_set_get_list() {
    let (_temp_dir, repo_path) = create_test_stk_repo();

    assert_cli_success(
        &run_stk(&["config", "set", "git.remote", "upstream"], &repo_path),
        "config set",
    );
    let get = run_stk(&["config", "get", "git.remote"], &repo_path);
    assert_cli_success(&get, "config get");
    assert_output_contains(&get, "git.remote = upstream", "config get output");

    let list = run_stk(&["config", "list"], &repo_path);
    assert_output_contains(&list, "repo.trunk = main", "config list");
    assert_output_contains(&list, "repo.trailing_trunk = (not set)", "config list");

    assert_eq!(load_settings(&repo_path).unwrap().git.remote, "upstream");
}

#[test]
fn test_config_rejects_invalid_values() {
    let (_temp_dir, repo_path) = create_test_stk_repo();

    let same_as_trunk = run_stk(&["config", "set", "repo.trailing_trunk", "main"], &repo_path);
    assert_cli_error_contains(&same_as_trunk, "trailing trunk = trunk", "differ");

    let unknown = run_stk(&["config", "set", "repo.nope", "x"], &repo_path);
    assert_cli_error_contains(&unknown, "unknown key", "Unknown config key");

    assert_eq!(load_settings(&repo_path).unwrap(), Settings::default_for_repo("main", None));
}

#[test]
fn test_init_with_trailing_trunk_sets_default_parent() {
    let (_temp_dir, repo_path) = create_test_git_repo();
    git(&repo_path, &["branch", "develop"]);
    git(&repo_path, &["branch", "topic"]);

    assert_cli_success(
        &run_stk(&["init", "--trailing-trunk", "develop"], &repo_path),
        "stk init --trailing-trunk",
    );
    assert_cli_success(&run_stk(&["track", "topic"], &repo_path), "stk track topic");

    let status = run_stk(&["status"], &repo_path);
    assert_output_contains(&status, "develop", "status lists trailing trunk");
    let rows = stk_cli::stack::JsonBranchStore::for_repo(&repo_path);
    let rows = stk_cli::stack::BranchStore::load(&rows).unwrap();
    let topic = rows.iter().find(|row| row.name == "topic").unwrap();
    assert_eq!(topic.parent.as_deref(), Some("develop"));
}
