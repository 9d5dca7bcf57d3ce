use crate::domain::SkippedProject;
use crate::hosting::PullRequest;
use crate::resolver::display_location;
use std::fmt;
use std::path::PathBuf;

/// Warnings raised at the edges of a release run.
/// None of them stops the run, but each should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Nothing qualifies for a release
    NoReleasableChanges,
    /// A project failed to resolve and was left out of the release
    ProjectSkipped {
        name: String,
        location: PathBuf,
        reason: String,
    },
    /// Only nested projects changed; the release keeps the root version
    RootVersionUnchanged { name: String, version: String },
    /// An open release-candidate pull request is already covered by a release
    ReleaseCandidateBehind { number: u64, branch: String },
    /// A stale release-candidate pull request could not be closed
    CloseFailed { number: u64, reason: String },
}

impl BoundaryWarning {
    /// One [BoundaryWarning::ProjectSkipped] per skipped project
    pub fn skipped(projects: &[SkippedProject]) -> Vec<BoundaryWarning> {
        projects
            .iter()
            .map(|project| BoundaryWarning::ProjectSkipped {
                name: project.name.clone(),
                location: project.location.clone(),
                reason: project.reason.clone(),
            })
            .collect()
    }

    pub fn behind(pr: &PullRequest) -> Self {
        BoundaryWarning::ReleaseCandidateBehind {
            number: pr.number,
            branch: pr.head_ref_name.clone(),
        }
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoReleasableChanges => {
                write!(f, "No releasable changes since the latest release")
            }
            BoundaryWarning::ProjectSkipped {
                name,
                location,
                reason,
            } => write!(
                f,
                "Skipped project '{}' ({}): {}",
                name,
                display_location(location),
                reason
            ),
            BoundaryWarning::RootVersionUnchanged { name, version } => write!(
                f,
                "Root project '{}' has no releasable changes, release stays at {}",
                name, version
            ),
            BoundaryWarning::ReleaseCandidateBehind { number, branch } => write!(
                f,
                "Release candidate #{} ({}) is not newer than the latest release",
                number, branch
            ),
            BoundaryWarning::CloseFailed { number, reason } => {
                write!(f, "Could not close pull request #{}: {}", number, reason)
            }
        }
    }
}
