//! Pure formatting functions for UI output.
//!
//! Everything user-facing goes through here; diagnostics go through
//! `tracing` instead.

use crate::boundary::BoundaryWarning;
use crate::domain::{ChangeDetails, ProjectChangeInformation};
use crate::resolver::display_location;
use crate::workflow::ProjectVersion;
use console::style;

/// Commits listed per project before the rest is summarized
const MAX_LISTED_COMMITS: usize = 10;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line per project, e.g. `App (src/App): 1.0.0 -> 1.1.0 [minor]`
pub fn format_change_line(change: &ProjectChangeInformation) -> String {
    let transition = if change.is_bumped() {
        format!(
            "{} -> {}",
            style(&change.version).red(),
            style(&change.next_version).green()
        )
    } else {
        style(&change.version).green().to_string()
    };

    format!(
        "{} ({}): {} [{}]",
        style(&change.name).bold(),
        display_location(&change.location),
        transition,
        change.version_type
    )
}

/// Show every qualifying project with its commits
pub fn display_change_details(details: &ChangeDetails) {
    println!(
        "\n{}",
        style(format!(
            "Changes in {}",
            details.root_path.display()
        ))
        .bold()
    );

    for change in &details.changes {
        println!("  {}", format_change_line(change));
        for commit in change.commits.iter().take(MAX_LISTED_COMMITS) {
            let summary = commit.message.lines().next().unwrap_or_default();
            let short_id: String = commit.id.chars().take(7).collect();
            println!("      {} {}", style(short_id).dim(), summary);
        }
        if change.commits.len() > MAX_LISTED_COMMITS {
            println!(
                "      ... and {} more commits",
                change.commits.len() - MAX_LISTED_COMMITS
            );
        }
    }

    for warning in BoundaryWarning::skipped(&details.skipped) {
        display_boundary_warning(&warning);
    }
}

pub fn display_project_versions(versions: &[ProjectVersion]) {
    println!("\n{}", style("Project versions:").bold());
    for project in versions {
        println!(
            "  {} ({}): {}",
            project.name,
            display_location(&project.location),
            style(&project.version).green()
        );
    }
}
