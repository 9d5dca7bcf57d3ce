use crate::domain::ConventionalCommit;
use std::collections::BTreeMap;

/// Marker placed before the summary of a breaking commit
pub const BREAKING_CHANGE_MARKER: &str = "**BREAKING CHANGE**";

/// Changelog section a commit is listed under.
///
/// Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Features,
    BugFixes,
    Performance,
    Refactoring,
    Documentation,
    Tests,
    Miscellaneous,
}

impl Section {
    /// Section for a commit type; unknown or missing types are miscellaneous
    pub fn for_type(commit_type: Option<&str>) -> Self {
        match commit_type {
            Some("feat") => Section::Features,
            Some("fix") => Section::BugFixes,
            Some("perf") => Section::Performance,
            Some("refactor") => Section::Refactoring,
            Some("docs") => Section::Documentation,
            Some("test") | Some("tests") => Section::Tests,
            _ => Section::Miscellaneous,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Features => "Features",
            Section::BugFixes => "Bug Fixes",
            Section::Performance => "Performance Improvements",
            Section::Refactoring => "Code Refactoring",
            Section::Documentation => "Documentation",
            Section::Tests => "Tests",
            Section::Miscellaneous => "Miscellaneous",
        }
    }
}

/// Render commits as Markdown sections.
///
/// Returns an empty string when there is nothing to render.
pub fn render(commits: &[ConventionalCommit]) -> String {
    let mut sections: BTreeMap<Section, Vec<&ConventionalCommit>> = BTreeMap::new();
    for commit in commits {
        sections
            .entry(Section::for_type(commit.commit_type.as_deref()))
            .or_default()
            .push(commit);
    }

    if sections.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = sections
        .into_iter()
        .map(|(section, commits)| {
            let bullets: Vec<String> = commits.into_iter().map(format_commit).collect();
            format!("### {}\n\n{}", section.title(), bullets.join("\n"))
        })
        .collect();

    format!("{}\n", rendered.join("\n\n"))
}

/// Format one commit as a bullet line
pub fn format_commit(commit: &ConventionalCommit) -> String {
    let mut message = capitalize(commit.summary());
    if commit.breaking_change {
        message = format!("{} {}", BREAKING_CHANGE_MARKER, message);
    }

    let scope = commit
        .scope
        .as_ref()
        .map(|scope| format!("**{}**:", scope))
        .unwrap_or_default();

    let parts: Vec<&str> = [scope.as_str(), message.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

    format!("- {}", parts.join(" "))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
