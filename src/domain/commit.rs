use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static CONVENTIONAL_COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<type>\w+)(?:\((?P<scope>[^)]+)\))?(?P<annotation>!?):\s*(?P<message>[\s\S]+?)\s*$",
    )
    .expect("conventional commit pattern is valid")
});

static BREAKING_CHANGE_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^BREAKING CHANGE:").expect("footer pattern is valid"));

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConventionalCommit {
    /// Lower-cased type token, `None` when the message is not conventional
    pub commit_type: Option<String>,
    pub scope: Option<String>,
    pub breaking_change: bool,
    /// Text after the delimiter, or the whole message when not conventional
    pub message: String,
}

impl ConventionalCommit {
    /// Parse a commit message according to the conventional commits grammar
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text
    ///
    /// A `BREAKING CHANGE:` line anywhere in a conventional message marks the
    /// commit as breaking even without the `!` marker.
    pub fn parse(raw: &str) -> Self {
        match CONVENTIONAL_COMMIT.captures(raw) {
            Some(captures) => {
                let commit_type = captures
                    .name("type")
                    .map(|m| m.as_str().to_lowercase());
                let scope = captures.name("scope").map(|m| m.as_str().to_string());
                let annotated = captures.name("annotation").map(|m| m.as_str()) == Some("!");
                let message = captures
                    .name("message")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();

                ConventionalCommit {
                    commit_type,
                    scope,
                    breaking_change: annotated || BREAKING_CHANGE_FOOTER.is_match(raw),
                    message,
                }
            }
            None => ConventionalCommit {
                commit_type: None,
                scope: None,
                breaking_change: false,
                message: raw.trim().to_string(),
            },
        }
    }

    /// First line of the message, used for changelog bullets
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_scope() {
        let commit = ConventionalCommit::parse("feat: my message");
        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope, None);
        assert!(!commit.breaking_change);
        assert_eq!(commit.message, "my message");
    }

    #[test]
    fn test_parse_with_scope() {
        let commit = ConventionalCommit::parse("feat(subject): my message");
        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope.as_deref(), Some("subject"));
        assert!(!commit.breaking_change);
        assert_eq!(commit.message, "my message");
    }

    #[test]
    fn test_parse_breaking_without_scope() {
        let commit = ConventionalCommit::parse("feat!: breaking change");
        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope, None);
        assert!(commit.breaking_change);
        assert_eq!(commit.message, "breaking change");
    }

    #[test]
    fn test_parse_breaking_with_scope() {
        let commit = ConventionalCommit::parse("feat(subject)!: breaking subject");
        assert_eq!(
            commit,
            ConventionalCommit {
                commit_type: Some("feat".to_string()),
                scope: Some("subject".to_string()),
                breaking_change: true,
                message: "breaking subject".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_non_conventional() {
        let commit = ConventionalCommit::parse("  Random commit message \n");
        assert_eq!(commit.commit_type, None);
        assert_eq!(commit.scope, None);
        assert!(!commit.breaking_change);
        assert_eq!(commit.message, "Random commit message");
    }

    #[test]
    fn test_parse_breaking_change_footer() {
        let commit = ConventionalCommit::parse("fix: a fix\n\nBREAKING CHANGE: behavior changed");
        assert_eq!(commit.commit_type.as_deref(), Some("fix"));
        assert!(commit.breaking_change);
        assert_eq!(commit.summary(), "a fix");
    }

    #[test]
    fn test_breaking_footer_must_start_a_line() {
        let commit = ConventionalCommit::parse("fix: mention of BREAKING CHANGE: inline");
        assert!(!commit.breaking_change);

        let lower = ConventionalCommit::parse("fix: a fix\n\nbreaking change: lowercase");
        assert!(!lower.breaking_change);
    }

    #[test]
    fn test_breaking_footer_ignored_on_non_conventional_message() {
        let commit = ConventionalCommit::parse("Rework things\n\nBREAKING CHANGE: all of it");
        assert_eq!(commit.commit_type, None);
        assert!(!commit.breaking_change);
        assert_eq!(commit.summary(), "Rework things");
    }

    #[test]
    fn test_type_is_lowercased_and_whitespace_trimmed() {
        let commit = ConventionalCommit::parse("  FIX(Api):   handle nulls  ");
        assert_eq!(commit.commit_type.as_deref(), Some("fix"));
        assert_eq!(commit.scope.as_deref(), Some("Api"));
        assert_eq!(commit.message, "handle nulls");
    }
}
