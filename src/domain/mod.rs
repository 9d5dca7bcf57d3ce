//! Domain logic - pure business rules independent of git operations

pub mod commit;
pub mod project;
pub mod tag;
pub mod version;

pub use commit::ConventionalCommit;
pub use project::{
    select_root_project, ChangeDetails, ProjectChangeInformation, ProjectDescriptor,
    RepositoryChange, SkippedProject,
};
pub use tag::{coerce_version, TagPattern};
pub use version::{increment, VersionBumpCategory};
