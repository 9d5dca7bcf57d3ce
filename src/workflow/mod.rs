//! Release workflows
//!
//! Each workflow resolves the change set and then drives the collaborators:
//!
//! - `release_candidate`: bump versions, write changelogs, push the release
//!   branch and open or refresh its pull request
//! - `update`: bump versions and write changelogs in place, with an optional
//!   prerelease suffix and build number
//! - `create_release` and friends in [release]: publish, promote and police
//!   release-candidate pull requests
//!
//! The workflows are decoupled from clap so they can be driven from tests
//! with in-memory collaborators.

pub mod release;

pub use release::PublishedRelease;

use crate::changelog::update_changelog_file;
use crate::config::Config;
use crate::domain::{ChangeDetails, SkippedProject};
use crate::error::Result;
use crate::git::{PublishSequence, ReleaseWriter, SourceControl};
use crate::hosting::{ReleaseHost, Upsert};
use crate::manifest::{ManifestWriter, ProjectDiscovery};
use crate::resolver::{ChangeSetResolver, ResolverOptions};
use serde::Serialize;
use std::collections::HashSet;
use std::iter;
use std::path::PathBuf;

/// Version of one project after a workflow ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectVersion {
    pub name: String,
    pub location: PathBuf,
    pub version: String,
}

/// Result of [Workflow::release_candidate]
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseCandidate {
    pub branch: String,
    pub title: String,
    /// Set only when the root project version actually moved
    pub next_version: Option<String>,
    pub changelog: String,
    pub pull_request: Upsert,
    pub updated_projects: Vec<ProjectVersion>,
    pub skipped: Vec<SkippedProject>,
}

/// Result of [Workflow::update]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub changelog: String,
    /// Every discovered project with the version its manifest now declares
    pub versions: Vec<ProjectVersion>,
    pub skipped: Vec<SkippedProject>,
}

/// The collaborators a workflow runs against
pub struct Workflow<'a> {
    config: &'a Config,
    source: &'a dyn SourceControl,
    writer: &'a dyn ReleaseWriter,
    discovery: &'a dyn ProjectDiscovery,
    manifests: &'a dyn ManifestWriter,
    host: &'a dyn ReleaseHost,
}

impl<'a> Workflow<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn SourceControl,
        writer: &'a dyn ReleaseWriter,
        discovery: &'a dyn ProjectDiscovery,
        manifests: &'a dyn ManifestWriter,
        host: &'a dyn ReleaseHost,
    ) -> Self {
        Workflow {
            config,
            source,
            writer,
            discovery,
            manifests,
            host,
        }
    }

    /// Resolve the change set without touching anything
    pub fn changes(&self, bump_version: bool) -> Result<Option<ChangeDetails>> {
        ChangeSetResolver::new(
            self.source,
            self.discovery,
            self.host,
            ResolverOptions::from(self.config),
        )
        .resolve(bump_version)
    }

    /// Prepare and publish a release-candidate pull request.
    ///
    /// # Returns
    /// `Ok(None)` when nothing qualifies for a release
    pub fn release_candidate(&self) -> Result<Option<ReleaseCandidate>> {
        let Some(details) = self.changes(true)? else {
            return Ok(None);
        };

        let updated_projects = self.apply_updates(&details, None, None)?;

        let root = &details.repository.change;
        let branch = self.config.release.branch_pattern()?.format(&root.next_version);
        let title = self.config.release.title_pattern()?.format(&root.next_version);

        PublishSequence::new(self.writer, &self.config.release.remote, &branch, &title).run()?;
        let pull_request =
            self.host
                .create_or_update_pull_request(&branch, &title, &details.changelog)?;

        tracing::info!(%branch, ?pull_request, "release candidate published");

        Ok(Some(ReleaseCandidate {
            branch,
            title,
            next_version: root.is_bumped().then(|| root.next_version.clone()),
            changelog: details.changelog.clone(),
            pull_request,
            updated_projects,
            skipped: details.skipped.clone(),
        }))
    }

    /// Bump versions and write changelogs in the working tree.
    ///
    /// # Arguments
    /// * `suffix` - Appended to the package version as `-<suffix>`
    /// * `build_number` - Fourth component of the assembly version
    pub fn update(
        &self,
        suffix: Option<&str>,
        build_number: Option<&str>,
    ) -> Result<Option<UpdateReport>> {
        let Some(details) = self.changes(true)? else {
            return Ok(None);
        };

        self.apply_updates(&details, suffix, build_number)?;

        let versions = self
            .discovery
            .discover(&details.root_path)?
            .into_iter()
            .map(|project| ProjectVersion {
                name: project.name,
                location: project.location,
                version: project.version,
            })
            .collect();

        Ok(Some(UpdateReport {
            changelog: details.changelog,
            versions,
            skipped: details.skipped,
        }))
    }

    /// Write changelog sections and manifest versions for the root project
    /// and every changed project, each manifest once
    fn apply_updates(
        &self,
        details: &ChangeDetails,
        suffix: Option<&str>,
        build_number: Option<&str>,
    ) -> Result<Vec<ProjectVersion>> {
        let mut seen = HashSet::new();
        let mut updated = Vec::new();

        for change in iter::once(&details.repository.change).chain(&details.changes) {
            if !seen.insert(change.manifest.clone()) {
                continue;
            }

            if let Some(section) = &change.changelog {
                let dir = details.root_path.join(&change.location);
                update_changelog_file(&dir, section, self.config.changelog.on_unrecognized)?;
            }

            self.manifests
                .set_version(&change.manifest, &change.next_version, suffix, build_number)?;

            updated.push(ProjectVersion {
                name: change.name.clone(),
                location: change.location.clone(),
                version: change.next_version.clone(),
            });
        }

        Ok(updated)
    }
}
