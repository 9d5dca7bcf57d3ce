//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, Write};

use anyhow::Result;
use console::Term;

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_change_details, display_error, display_project_versions,
    display_status, display_success, format_change_line,
};

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive); Enter means no. When stdout is
/// not a terminal there is nobody to ask and the action is confirmed, so the
/// same command works unattended in CI.
///
/// # Arguments
/// * `prompt` - The prompt message to display (without the "(y/N): " suffix)
pub fn confirm_action(prompt: &str) -> Result<bool> {
    if !Term::stdout().is_term() {
        return Ok(true);
    }

    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_confirmation(&input))
}

fn is_confirmation(input: &str) -> bool {
    let response = input.trim().to_lowercase();
    response == "y" || response == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confirmation() {
        assert!(is_confirmation("y\n"));
        assert!(is_confirmation(" YES "));
        assert!(!is_confirmation("\n"));
        assert!(!is_confirmation("no"));
    }
}
