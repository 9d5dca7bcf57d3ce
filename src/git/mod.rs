//! Git operations abstraction layer
//!
//! Reading history and mutating the repository are split into two traits so
//! the change resolution only ever depends on the read side.
//!
//! - [SourceControl]: repository root and path-scoped commit listing
//! - [ReleaseWriter]: branch, commit, push and tag operations used by the
//!   release workflows
//!
//! [repository::Git2Repository] implements both on top of `git2`;
//! [mock::MockRepository] is an in-memory double for tests. The mutating
//! operations are driven through the explicit step sequences in [sequence].
//!
//! ```rust
//! # use git_versioning::git::SourceControl;
//! # use std::path::Path;
//! # fn example<S: SourceControl>(scm: &S) -> git_versioning::Result<()> {
//! let commits = scm.list_commits(Path::new("src/Api"), Some("refs/tags/v1.0.0"), "HEAD")?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod sequence;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use sequence::{PublishSequence, PublishStep, SequenceError, StepOutcome, TagSequence};

use crate::error::Result;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Commit information for analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitInfo {
    /// Full commit hash
    pub id: String,
    /// `Name <email>`
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    /// Trimmed commit message
    pub message: String,
}

/// Read access to the history of a repository.
///
/// Implementors must be `Send + Sync`: projects are resolved concurrently
/// against one shared instance.
pub trait SourceControl: Send + Sync {
    /// Absolute path of the working tree root
    fn repository_root(&self) -> Result<PathBuf>;

    /// List commits reachable from `to_ref` but not from `from_ref` that touch
    /// `scope`.
    ///
    /// # Arguments
    /// * `scope` - Path relative to the repository root; empty means the whole tree
    /// * `from_ref` - Exclusive lower bound (e.g. `refs/tags/v1.0.0`), `None` for full history
    /// * `to_ref` - Inclusive upper bound, usually `HEAD`
    ///
    /// # Returns
    /// Commits newest first, as `git log` reports them. Callers sort.
    fn list_commits(
        &self,
        scope: &Path,
        from_ref: Option<&str>,
        to_ref: &str,
    ) -> Result<Vec<CommitInfo>>;
}

/// Mutating operations used to publish a release candidate and release tags.
///
/// Every operation has force semantics: re-running a release overwrites the
/// branch, tag and remote refs it produced before.
pub trait ReleaseWriter {
    /// Create or reset `branch` to the current HEAD and check it out
    fn checkout_branch(&self, branch: &str) -> Result<()>;

    /// Stage every change in the working tree, including deletions
    fn stage_all(&self) -> Result<()>;

    /// Commit the index on the current branch
    ///
    /// # Returns
    /// The new commit id
    fn commit(&self, message: &str) -> Result<String>;

    /// Force-push a local branch to `remote`
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Create or move a lightweight tag to HEAD
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Force-push a tag to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;
}
