use crate::config::ConventionalCommitsConfig;
use crate::domain::{ConventionalCommit, VersionBumpCategory};

/// Bump applied to commits whose type is unknown or missing.
///
/// Legacy behavior treats anything unrecognized as a fix. Override it through
/// [`ClassificationPolicy::unknown_type`] (`unknown_type_bump` in config).
pub const UNKNOWN_TYPE_BUMP: VersionBumpCategory = VersionBumpCategory::Patch;

/// Rules for mapping a conventional commit to a bump category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationPolicy {
    pub unknown_type: VersionBumpCategory,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        ClassificationPolicy {
            unknown_type: UNKNOWN_TYPE_BUMP,
        }
    }
}

impl From<&ConventionalCommitsConfig> for ClassificationPolicy {
    fn from(config: &ConventionalCommitsConfig) -> Self {
        ClassificationPolicy {
            unknown_type: config.unknown_type_bump,
        }
    }
}

/// Classify a commit with the default policy
pub fn classify(commit: &ConventionalCommit) -> VersionBumpCategory {
    classify_with(commit, &ClassificationPolicy::default())
}

/// Classify a commit; a breaking change always wins over its type
pub fn classify_with(
    commit: &ConventionalCommit,
    policy: &ClassificationPolicy,
) -> VersionBumpCategory {
    if commit.breaking_change {
        return VersionBumpCategory::Major;
    }

    match commit.commit_type.as_deref() {
        Some("feat") => VersionBumpCategory::Minor,
        Some("fix") => VersionBumpCategory::Patch,
        Some("docs") | Some("chore") => VersionBumpCategory::None,
        _ => policy.unknown_type,
    }
}

/// Reduce commits to the most severe bump, `None` for an empty slice
pub fn aggregate(commits: &[ConventionalCommit]) -> VersionBumpCategory {
    aggregate_with(commits, &ClassificationPolicy::default())
}

/// Reduce commits to the most severe bump under the given policy
pub fn aggregate_with(
    commits: &[ConventionalCommit],
    policy: &ClassificationPolicy,
) -> VersionBumpCategory {
    commits
        .iter()
        .map(|commit| classify_with(commit, policy))
        .fold(VersionBumpCategory::None, std::cmp::max)
}

/// Analyzes commit messages to determine the version bump category
pub struct VersionAnalyzer {
    policy: ClassificationPolicy,
}

impl VersionAnalyzer {
    /// Create a new version analyzer
    pub fn new(policy: ClassificationPolicy) -> Self {
        VersionAnalyzer { policy }
    }

    /// Parse raw commit messages
    pub fn parse_messages<S: AsRef<str>>(&self, messages: &[S]) -> Vec<ConventionalCommit> {
        messages
            .iter()
            .map(|m| ConventionalCommit::parse(m.as_ref()))
            .collect()
    }

    /// Classify a single parsed commit
    pub fn classify(&self, commit: &ConventionalCommit) -> VersionBumpCategory {
        classify_with(commit, &self.policy)
    }

    /// Aggregate parsed commits
    pub fn aggregate(&self, commits: &[ConventionalCommit]) -> VersionBumpCategory {
        aggregate_with(commits, &self.policy)
    }

    /// Analyze commit messages and determine version bump
    pub fn analyze_messages<S: AsRef<str>>(&self, messages: &[S]) -> VersionBumpCategory {
        self.aggregate(&self.parse_messages(messages))
    }
}

impl Default for VersionAnalyzer {
    fn default() -> Self {
        Self::new(ClassificationPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> VersionAnalyzer {
        VersionAnalyzer::default()
    }

    #[test]
    fn test_classify_breaking_overrides_type() {
        let commit = ConventionalCommit::parse("docs!: drop old guide");
        assert_eq!(classify(&commit), VersionBumpCategory::Major);
    }

    #[test]
    fn test_classify_feat_fix() {
        assert_eq!(
            classify(&ConventionalCommit::parse("feat: a")),
            VersionBumpCategory::Minor
        );
        assert_eq!(
            classify(&ConventionalCommit::parse("fix: b")),
            VersionBumpCategory::Patch
        );
    }

    #[test]
    fn test_classify_docs_and_chore_are_none() {
        assert_eq!(
            classify(&ConventionalCommit::parse("docs: readme")),
            VersionBumpCategory::None
        );
        assert_eq!(
            classify(&ConventionalCommit::parse("chore: deps")),
            VersionBumpCategory::None
        );
    }

    #[test]
    fn test_classify_unknown_and_missing_types_default_to_patch() {
        assert_eq!(
            classify(&ConventionalCommit::parse("style: format")),
            UNKNOWN_TYPE_BUMP
        );
        assert_eq!(
            classify(&ConventionalCommit::parse("Updated stuff")),
            VersionBumpCategory::Patch
        );
    }

    #[test]
    fn test_classify_with_overridden_unknown_policy() {
        let policy = ClassificationPolicy {
            unknown_type: VersionBumpCategory::None,
        };
        let commit = ConventionalCommit::parse("refactor: cleanup");
        assert_eq!(classify_with(&commit, &policy), VersionBumpCategory::None);
        // Known types are unaffected by the policy
        let feat = ConventionalCommit::parse("feat: search");
        assert_eq!(classify_with(&feat, &policy), VersionBumpCategory::Minor);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let commit = ConventionalCommit::parse("perf(db): faster queries");
        assert_eq!(classify(&commit), classify(&commit.clone()));
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert_eq!(aggregate(&[]), VersionBumpCategory::None);
    }

    #[test]
    fn test_aggregate_feat_and_fix_is_minor() {
        assert_eq!(
            analyzer().analyze_messages(&["feat: a", "fix: b"]),
            VersionBumpCategory::Minor
        );
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let messages = ["fix: a", "feat(api)!: b", "docs: c", "feat: d"];
        let forward = analyzer().analyze_messages(&messages);
        let mut reversed = messages;
        reversed.reverse();
        assert_eq!(forward, VersionBumpCategory::Major);
        assert_eq!(analyzer().analyze_messages(&reversed), forward);
    }

    #[test]
    fn test_analyze_only_docs_and_chore() {
        assert_eq!(
            analyzer().analyze_messages(&["docs: update readme", "chore: bump deps"]),
            VersionBumpCategory::None
        );
    }

    #[test]
    fn test_analyze_breaking_change_via_footer() {
        let messages = ["fix: rename API field\n\nBREAKING CHANGE: field changed from X to Y"];
        assert_eq!(
            analyzer().analyze_messages(&messages),
            VersionBumpCategory::Major
        );
    }

    #[test]
    fn test_analyze_real_release_cycle() {
        let messages = [
            "feat(api): add user list endpoint",
            "feat(auth): add role-based access",
            "fix(ui): modal alignment",
            "docs: update api docs",
        ];
        assert_eq!(
            analyzer().analyze_messages(&messages),
            VersionBumpCategory::Minor
        );
    }
}
