//! Release and pull request hosting
//!
//! [ReleaseHost] covers the hosting operations the release workflows need:
//! looking up the latest published release, maintaining the release-candidate
//! pull request, drafting and promoting releases and dispatching workflows.
//! [gh::GhCli] implements it with the GitHub CLI.

pub mod gh;

pub use gh::{GhCli, LabelSpec};

use crate::domain::{coerce_version, TagPattern};
use crate::error::Result;
use serde::Deserialize;

/// Open pull request as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(rename = "headRefName")]
    pub head_ref_name: String,
}

/// Whether a pull request or release was created or an existing one edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Result of closing a batch of pull requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseReport {
    pub closed: Vec<u64>,
    /// Pull requests that could not be closed, with the reason
    pub failed: Vec<(u64, String)>,
}

pub trait ReleaseHost: Send + Sync {
    /// Tag of the highest non-draft release, ordered by coerced semver
    fn latest_release_tag(&self) -> Result<Option<String>>;

    /// Open or edit the labelled pull request for `head_ref`
    fn create_or_update_pull_request(&self, head_ref: &str, title: &str, body: &str)
        -> Result<Upsert>;

    /// Create the release `tag` or edit it when it already exists
    fn create_or_update_release(&self, tag: &str, notes: &str, draft: bool) -> Result<Upsert>;

    /// Publish a draft release
    fn promote_release(&self, tag: &str) -> Result<()>;

    fn dispatch_workflow(&self, workflow: &str) -> Result<()>;

    /// Open pull requests carrying the release-candidate label
    fn release_pull_requests(&self) -> Result<Vec<PullRequest>>;

    fn close_pull_request(&self, number: u64, comment: &str) -> Result<()>;

    /// Release-candidate pull requests whose branch version is not above the
    /// latest published release.
    ///
    /// Pull requests whose branch does not follow `branch_pattern` never block.
    fn blocking_release_prs(&self, branch_pattern: &TagPattern) -> Result<Vec<PullRequest>> {
        let Some(latest) = self.latest_release_tag()? else {
            return Ok(Vec::new());
        };
        let Some(latest) = coerce_version(&latest) else {
            tracing::warn!("latest release tag '{}' holds no version", latest);
            return Ok(Vec::new());
        };

        Ok(self
            .release_pull_requests()?
            .into_iter()
            .filter(|pr| {
                branch_pattern
                    .extract_version(&pr.head_ref_name)
                    .is_some_and(|version| version <= latest)
            })
            .collect())
    }

    /// Close release-candidate pull requests whose branch major version is
    /// below `threshold_major`.
    ///
    /// A failure to close one pull request is recorded in the report and does
    /// not stop the others.
    fn close_release_prs_below(
        &self,
        branch_pattern: &TagPattern,
        threshold_major: u64,
    ) -> Result<CloseReport> {
        let mut report = CloseReport::default();

        for pr in self.release_pull_requests()? {
            let Some(version) = branch_pattern.extract_version(&pr.head_ref_name) else {
                continue;
            };
            if version.major >= threshold_major {
                continue;
            }

            let comment = format!(
                "Superseded by the {}.x release line.",
                threshold_major
            );
            match self.close_pull_request(pr.number, &comment) {
                Ok(()) => {
                    tracing::info!(number = pr.number, branch = %pr.head_ref_name, "closed stale release PR");
                    report.closed.push(pr.number);
                }
                Err(e) => {
                    tracing::warn!("failed to close PR #{}: {}", pr.number, e);
                    report.failed.push((pr.number, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockHost;
    use super::*;

    fn pr(number: u64, branch: &str) -> PullRequest {
        PullRequest {
            number,
            head_ref_name: branch.to_string(),
        }
    }

    fn branch_pattern() -> TagPattern {
        TagPattern::new("versioning/release/{version}").unwrap()
    }

    #[test]
    fn test_blocking_release_prs() {
        let mut host = MockHost::with_latest("v5.0.4");
        host.pull_requests = vec![
            pr(1, "versioning/release/5.0.3"),
            pr(2, "versioning/release/5.0.4"),
            pr(3, "versioning/release/5.1.0"),
            pr(4, "feature/unrelated"),
        ];

        let blocking: Vec<u64> = host
            .blocking_release_prs(&branch_pattern())
            .unwrap()
            .into_iter()
            .map(|pr| pr.number)
            .collect();
        assert_eq!(blocking, vec![1, 2]);
    }

    #[test]
    fn test_nothing_blocks_without_a_release() {
        let mut host = MockHost::default();
        host.pull_requests = vec![pr(1, "versioning/release/0.1.0")];
        assert!(host.blocking_release_prs(&branch_pattern()).unwrap().is_empty());
    }

    #[test]
    fn test_close_release_prs_below_collects_failures() {
        let mut host = MockHost::default();
        host.pull_requests = vec![
            pr(1, "versioning/release/1.4.0"),
            pr(2, "versioning/release/2.0.1"),
            pr(3, "versioning/release/3.0.0"),
            pr(4, "docs/typo"),
        ];
        host.unclosable.insert(2);

        let report = host.close_release_prs_below(&branch_pattern(), 3).unwrap();
        assert_eq!(report.closed, vec![1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 2);
        assert_eq!(host.calls(), vec!["close 1"]);
    }
}
