use super::Workflow;
use crate::domain::coerce_version;
use crate::error::Result;
use crate::git::TagSequence;
use crate::hosting::{CloseReport, PullRequest, Upsert};

/// Result of [Workflow::create_release]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRelease {
    pub tag: String,
    pub version: String,
    pub notes: String,
    pub draft: bool,
    pub release: Upsert,
}

impl Workflow<'_> {
    /// Create or update the release for the root project's declared version,
    /// then tag HEAD and push the tag.
    ///
    /// Runs after a release-candidate pull request was merged, so the
    /// manifests already carry the new version and nothing is bumped.
    pub fn create_release(&self, draft: bool) -> Result<Option<PublishedRelease>> {
        let Some(details) = self.changes(false)? else {
            return Ok(None);
        };

        let version = details.repository.change.version.clone();
        let tag = self.config.release.tag_pattern()?.format(&version);

        let release = self
            .host
            .create_or_update_release(&tag, &details.changelog, draft)?;
        TagSequence::new(self.writer, &self.config.release.remote, vec![tag.clone()]).run()?;

        tracing::info!(%tag, draft, "release tagged");
        Ok(Some(PublishedRelease {
            tag,
            version,
            notes: details.changelog,
            draft,
            release,
        }))
    }

    /// Publish the draft release of `version`
    ///
    /// # Returns
    /// The promoted tag
    pub fn promote(&self, version: &str) -> Result<String> {
        let tag = self.config.release.tag_pattern()?.format(version);
        self.host.promote_release(&tag)?;
        tracing::info!(%tag, "release promoted");
        Ok(tag)
    }

    /// Open release-candidate pull requests already covered by a published release
    pub fn check_release_candidates(&self) -> Result<Vec<PullRequest>> {
        let pattern = self.config.release.branch_pattern()?;
        self.host.blocking_release_prs(&pattern)
    }

    /// Close release-candidate pull requests of older major lines.
    ///
    /// Without `below` the major of the latest published release is used;
    /// when nothing was released yet there is nothing to close.
    pub fn close_stale(&self, below: Option<u64>) -> Result<CloseReport> {
        let threshold = match below {
            Some(major) => major,
            None => {
                let latest = self.host.latest_release_tag()?;
                match latest.as_deref().and_then(coerce_version) {
                    Some(version) => version.major,
                    None => {
                        tracing::info!("no published release, nothing to close");
                        return Ok(CloseReport::default());
                    }
                }
            }
        };

        let pattern = self.config.release.branch_pattern()?;
        self.host.close_release_prs_below(&pattern, threshold)
    }

    pub fn dispatch(&self, workflow: &str) -> Result<()> {
        self.host.dispatch_workflow(workflow)?;
        tracing::info!(workflow, "workflow dispatched");
        Ok(())
    }
}
