pub mod commands;
pub mod output;

use crate::errors::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stk")]
#[command(about = "stk - manage stacks of dependent git branches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the repository for stk and track the trunk
    Init {
        /// Trunk branch (defaults to main, master, or the current branch)
        #[arg(long)]
        trunk: Option<String>,

        /// Optional floor branch that new stacks start from
        #[arg(long)]
        trailing_trunk: Option<String>,

        /// Force initialization even if already initialized
        #[arg(long)]
        force: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Start tracking an existing branch
    Track {
        /// Branch to track (defaults to the current branch)
        branch: Option<String>,

        /// Parent branch (defaults to the trailing trunk or trunk)
        #[arg(long, short)]
        parent: Option<String>,
    },

    /// Stop tracking a branch without touching it in git
    Untrack {
        /// Branch to untrack (defaults to the current branch)
        branch: Option<String>,
    },

    /// Create a branch on top of the current one and track it
    Create {
        /// Name of the new branch
        name: String,
    },

    /// Rename a tracked branch in git and in the stack
    Rename {
        /// New branch name
        new_name: String,

        /// Branch to rename (defaults to the current branch)
        #[arg(long, short)]
        branch: Option<String>,
    },

    /// Move a branch onto a new parent and restack it with its descendants
    Move {
        /// New parent branch
        #[arg(long)]
        onto: String,

        /// Branch to move (defaults to the current branch)
        branch: Option<String>,
    },

    /// Rebase a branch and its descendants onto their parents' tips
    Restack {
        /// Branch to start from (defaults to the current branch)
        branch: Option<String>,

        /// Restack only this branch, not its descendants
        #[arg(long)]
        only: bool,
    },

    /// Resume an operation stopped by conflicts
    Continue,

    /// Cancel the operation in progress
    Abort,

    /// Show the tracked branches and which need a restack
    Status,

    /// Pull the trunk and forget branches deleted from git
    Sync,

    /// Push a branch and the branches below it
    Push {
        /// Branch to push (defaults to the current branch)
        branch: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., repo.trailing_trunk)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List all configuration values
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Set up logging based on verbosity
        self.setup_logging();

        if self.no_color {
            console::set_colors_enabled(false);
        }

        match self.command {
            Commands::Init {
                trunk,
                trailing_trunk,
                force,
            } => commands::init::run(trunk, trailing_trunk, force).await,
            Commands::Config { action } => commands::config::run(action).await,
            Commands::Track { branch, parent } => commands::track::track(branch, parent).await,
            Commands::Untrack { branch } => commands::track::untrack(branch).await,
            Commands::Create { name } => commands::branch::create(name).await,
            Commands::Rename { new_name, branch } => {
                commands::branch::rename(branch, new_name).await
            }
            Commands::Move { onto, branch } => commands::branch::move_onto(branch, onto).await,
            Commands::Restack { branch, only } => commands::restack::restack(branch, only).await,
            Commands::Continue => commands::restack::continue_operation().await,
            Commands::Abort => commands::restack::abort().await,
            Commands::Status => commands::status::run().await,
            Commands::Sync => commands::sync::run().await,
            Commands::Push { branch } => commands::push::run(branch).await,
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .without_time();

        if self.no_color {
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}
