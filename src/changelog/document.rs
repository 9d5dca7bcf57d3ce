use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Header every persisted changelog starts with
pub const CHANGELOG_HEADER: &str = "# Changelog\n\n";

/// File name of the persisted changelog inside a project directory
pub const CHANGELOG_FILE_NAME: &str = "CHANGELOG.md";

/// What to do with an existing changelog that lacks [`CHANGELOG_HEADER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedChangelogPolicy {
    /// Drop the old content
    #[default]
    Discard,
    /// Keep the old content below the new section
    Append,
}

/// Existing changelog content, classified by whether it carries the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorChangelog {
    Absent,
    /// Entries below the header, header stripped
    Recognized(String),
    /// Raw content of a document without the header
    Unrecognized(String),
}

impl PriorChangelog {
    pub fn classify(existing: Option<&str>) -> Self {
        match existing {
            None => PriorChangelog::Absent,
            Some(text) => match text.strip_prefix(CHANGELOG_HEADER) {
                Some(entries) => PriorChangelog::Recognized(entries.to_string()),
                None => PriorChangelog::Unrecognized(text.to_string()),
            },
        }
    }
}

/// Prepend a new section to prior changelog content.
///
/// Re-running with the same section inserts it again; every run is a new
/// release stacked above history.
pub fn merge(
    prior: &PriorChangelog,
    new_section: &str,
    policy: UnrecognizedChangelogPolicy,
) -> String {
    let mut document = format!("{}{}", CHANGELOG_HEADER, new_section);

    match prior {
        PriorChangelog::Absent => {}
        PriorChangelog::Recognized(entries) => {
            document.push_str("\n\n");
            document.push_str(entries);
        }
        PriorChangelog::Unrecognized(raw) => match policy {
            UnrecognizedChangelogPolicy::Discard => {
                tracing::warn!(
                    "existing changelog does not start with the expected header, discarding {} bytes",
                    raw.len()
                );
            }
            UnrecognizedChangelogPolicy::Append => {
                document.push_str("\n\n");
                document.push_str(raw);
            }
        },
    }

    document
}

/// Classify `existing` and merge `new_section` into it
pub fn merge_document(
    existing: Option<&str>,
    new_section: &str,
    policy: UnrecognizedChangelogPolicy,
) -> String {
    merge(&PriorChangelog::classify(existing), new_section, policy)
}

/// Create or update `<dir>/CHANGELOG.md` with a new section on top.
///
/// # Returns
/// Path of the written file
pub fn update_changelog_file(
    dir: &Path,
    new_section: &str,
    policy: UnrecognizedChangelogPolicy,
) -> Result<PathBuf> {
    let path = dir.join(CHANGELOG_FILE_NAME);
    let existing = if path.exists() {
        Some(fs::read_to_string(&path)?)
    } else {
        None
    };

    let content = merge_document(existing.as_deref(), new_section, policy);
    fs::write(&path, content)?;
    tracing::debug!(path = %path.display(), "changelog updated");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_merge_absent_document() {
        assert_eq!(
            merge_document(None, "- entry", UnrecognizedChangelogPolicy::Discard),
            "# Changelog\n\n- entry"
        );
    }

    #[test]
    fn test_merge_recognized_document() {
        assert_eq!(
            merge_document(
                Some("# Changelog\n\n- old"),
                "- new",
                UnrecognizedChangelogPolicy::Discard
            ),
            "# Changelog\n\n- new\n\n- old"
        );
    }

    #[test]
    fn test_merge_unrecognized_discard() {
        assert_eq!(
            merge_document(
                Some("Release notes\n- old"),
                "- new",
                UnrecognizedChangelogPolicy::Discard
            ),
            "# Changelog\n\n- new"
        );
    }

    #[test]
    fn test_merge_unrecognized_append() {
        assert_eq!(
            merge_document(
                Some("Release notes\n- old"),
                "- new",
                UnrecognizedChangelogPolicy::Append
            ),
            "# Changelog\n\n- new\n\nRelease notes\n- old"
        );
    }

    #[test]
    fn test_merge_is_not_content_idempotent() {
        let once = merge_document(None, "- entry", UnrecognizedChangelogPolicy::Discard);
        let twice = merge_document(Some(&once), "- entry", UnrecognizedChangelogPolicy::Discard);
        assert_eq!(twice, "# Changelog\n\n- entry\n\n- entry");
    }

    #[test]
    fn test_classify_prior() {
        assert_eq!(PriorChangelog::classify(None), PriorChangelog::Absent);
        assert_eq!(
            PriorChangelog::classify(Some("# Changelog\n\nbody")),
            PriorChangelog::Recognized("body".to_string())
        );
        assert_eq!(
            PriorChangelog::classify(Some("# Changelog\nbody")),
            PriorChangelog::Unrecognized("# Changelog\nbody".to_string())
        );
    }

    #[test]
    fn test_update_changelog_file_creates_then_prepends() {
        let temp = TempDir::new().unwrap();

        let path = update_changelog_file(
            temp.path(),
            "- Initial changelog entry",
            UnrecognizedChangelogPolicy::Discard,
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Changelog\n\n- Initial changelog entry"
        );

        update_changelog_file(
            temp.path(),
            "- New entry added",
            UnrecognizedChangelogPolicy::Discard,
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Changelog\n\n- New entry added\n\n- Initial changelog entry"
        );
    }
}
