use console::{style, Emoji};
use std::fmt::Display;

/// Centralized output formatting utilities for consistent CLI presentation
pub struct Output;

impl Output {
    /// Print a success message with checkmark
    pub fn success<T: Display>(message: T) {
        println!("{} {}", style(Emojis::SUCCESS).green(), message);
    }

    /// Print an error message with X mark
    pub fn error<T: Display>(message: T) {
        println!("{} {}", style(Emojis::ERROR).red(), message);
    }

    /// Print a warning message with warning emoji
    pub fn warning<T: Display>(message: T) {
        println!("{} {}", style(Emojis::WARNING).yellow(), message);
    }

    /// Print an info message with info emoji
    pub fn info<T: Display>(message: T) {
        println!("{} {}", style(Emojis::INFO).cyan(), message);
    }

    /// Print a sub-item with arrow prefix
    pub fn sub_item<T: Display>(message: T) {
        println!("  {} {}", style(Emojis::ARROW).dim(), message);
    }

    /// Print a bullet point
    pub fn bullet<T: Display>(message: T) {
        println!("  {} {}", style("•").dim(), message);
    }

    /// Print a section header
    pub fn section<T: Display>(title: T) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Print a tip/suggestion
    pub fn tip<T: Display>(message: T) {
        println!("{} {}", style("TIP:").cyan(), style(message).dim());
    }

    /// Print progress indicator
    pub fn progress<T: Display>(message: T) {
        println!("{} {}", style(Emojis::ARROW).cyan(), message);
    }

    /// Print a command example
    pub fn command_example<T: Display>(command: T) {
        println!("  {}", style(command).yellow());
    }

    /// Print next steps guidance
    pub fn next_steps(steps: &[&str]) {
        println!();
        Self::tip("Next steps:");
        for step in steps {
            Self::bullet(step);
        }
    }

    /// Guidance after a rebase stopped on conflicts
    pub fn conflict_guidance(branch: &str) {
        Self::warning(format!(
            "Conflicts while restacking '{}'. Resolve them manually.",
            style(branch).cyan()
        ));
        Self::sub_item("Fix the conflicted files and stage them with 'git add'");
        Self::sub_item("Then resume with:");
        Self::command_example("stk continue");
        Self::sub_item("Or give up on the remaining branches with:");
        Self::command_example("stk abort");
    }

    /// One line of the stack listing, indented by depth
    pub fn tree_line(depth: usize, name: &str, is_current: bool, markers: &[String]) {
        let indent = "  ".repeat(depth);
        let bullet = if is_current {
            style("●").green().to_string()
        } else {
            style("○").dim().to_string()
        };
        let name = if is_current {
            style(name).green().bold().to_string()
        } else {
            name.to_string()
        };

        if markers.is_empty() {
            println!("{indent}{bullet} {name}");
        } else {
            println!("{indent}{bullet} {name} {}", style(markers.join(" ")).dim());
        }
    }

    /// Print empty line for spacing
    pub fn spacing() {
        println!();
    }
}

/// Emojis for different contexts
pub struct Emojis;

impl Emojis {
    pub const SUCCESS: Emoji<'_, '_> = Emoji("✓", "OK");
    pub const ERROR: Emoji<'_, '_> = Emoji("✗", "ERROR");
    pub const WARNING: Emoji<'_, '_> = Emoji("⚠", "WARNING");
    pub const INFO: Emoji<'_, '_> = Emoji("ℹ", "INFO");
    pub const ARROW: Emoji<'_, '_> = Emoji("→", "->");
}
