use crate::cli::output::Output;
use crate::config::{initialize_repo, is_repo_initialized, Settings};
use crate::errors::{Result, StkError};
use crate::git::{find_repository_root, GitRepository, Vcs};
use crate::stack::{BranchStore, JsonBranchStore, StackManager};
use std::env;
use std::path::Path;

/// Initialize a repository for stk
pub async fn run(trunk: Option<String>, trailing_trunk: Option<String>, force: bool) -> Result<()> {
    tracing::debug!("Initializing stk repository...");

    let current_dir = env::current_dir()
        .map_err(|e| StkError::config(format!("Could not get current directory: {e}")))?;
    let repo_root = find_repository_root(&current_dir)?;
    tracing::debug!("Found Git repository at: {}", repo_root.display());

    let settings = initialize(&repo_root, trunk, trailing_trunk, force)?;

    Output::success("stk repository initialized");
    Output::sub_item(format!("Trunk: {}", settings.repo.trunk));
    if let Some(trailing) = &settings.repo.trailing_trunk {
        Output::sub_item(format!("Trailing trunk: {trailing}"));
    }
    Output::next_steps(&[
        "Track an existing branch: stk track <branch>",
        "Or start a new one: stk create <name>",
    ]);

    Ok(())
}

/// Write settings and track the floor branches
pub fn initialize(
    repo_root: &Path,
    trunk: Option<String>,
    trailing_trunk: Option<String>,
    force: bool,
) -> Result<Settings> {
    if is_repo_initialized(repo_root) && !force {
        return Err(StkError::config(
            "Repository is already initialized for stk. Use --force to reinitialize.",
        ));
    }
    if force && is_repo_initialized(repo_root) {
        tracing::warn!("Force reinitializing repository...");
    }

    let repo = GitRepository::open(repo_root)?;
    let trunk = match trunk {
        Some(trunk) => trunk,
        None => detect_trunk(&repo)?,
    };
    for branch in std::iter::once(&trunk).chain(trailing_trunk.as_ref()) {
        if !repo.branch_exists(branch) {
            return Err(StkError::branch(format!(
                "Branch '{branch}' does not exist"
            )));
        }
    }

    let settings = Settings::default_for_repo(&trunk, trailing_trunk);
    initialize_repo(repo_root, &settings)?;

    let mut manager = StackManager::new(JsonBranchStore::for_repo(repo_root));
    match manager.get_base()? {
        None => manager.track_branch(&trunk, None, None)?,
        Some(base) if base.name != trunk => {
            return Err(StkError::config(format!(
                "'{}' is already tracked as the trunk. Untrack the stack or keep that trunk.",
                base.name
            )));
        }
        Some(_) => {}
    }
    if let Some(trailing) = &settings.repo.trailing_trunk {
        if !manager.is_tracked(trailing)? {
            let trunk_sha = repo.get_sha(&trunk)?;
            manager.track_branch(trailing, Some(&trunk), Some(&trunk_sha))?;
        }
    }
    tracing::debug!(
        "Tracking {} branch(es) in {:?}",
        manager.store().load()?.len(),
        manager.store().path()
    );

    Ok(settings)
}

/// main, then master, then whatever is checked out
fn detect_trunk(repo: &GitRepository) -> Result<String> {
    ["main", "master"]
        .into_iter()
        .find(|name| repo.branch_exists(name))
        .map(str::to_string)
        .map_or_else(|| repo.current_branch_name(), Ok)
}
