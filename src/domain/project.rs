use crate::domain::VersionBumpCategory;
use crate::git::CommitInfo;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// A project discovered in the repository, identified by its manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDescriptor {
    pub name: String,
    /// Version as declared in the manifest
    pub version: String,
    /// Absolute path of the manifest file
    pub path: PathBuf,
    /// Manifest directory relative to the repository root
    pub location: PathBuf,
}

impl ProjectDescriptor {
    /// Build a descriptor, deriving `location` from the manifest path
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        root: &Path,
    ) -> Self {
        let path = path.into();
        let location = path
            .parent()
            .map(|dir| relative_to(dir, root))
            .unwrap_or_default();

        ProjectDescriptor {
            name: name.into(),
            version: version.into(),
            path,
            location,
        }
    }

    /// Directory that holds the manifest; commits are scoped to this subtree
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Number of path segments between the repository root and the manifest
    pub fn depth(&self, root: &Path) -> usize {
        relative_to(&self.path, root)
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count()
    }
}

/// Change information computed for one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectChangeInformation {
    pub name: String,
    pub location: PathBuf,
    /// Absolute path of the manifest the version was read from
    pub manifest: PathBuf,
    pub version: String,
    pub next_version: String,
    /// Commits since the last release, oldest first
    pub commits: Vec<CommitInfo>,
    pub version_type: VersionBumpCategory,
    /// `## <name>: v<next_version>` block, absent when nothing qualifies
    pub changelog: Option<String>,
}

impl ProjectChangeInformation {
    /// Whether this project warrants a release
    pub fn qualifies(&self) -> bool {
        self.version_type != VersionBumpCategory::None
    }

    /// Whether the resolved version differs from the declared one
    pub fn is_bumped(&self) -> bool {
        self.version != self.next_version
    }
}

/// The change information of the designated root project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryChange {
    pub change: ProjectChangeInformation,
}

/// A project left out of a report because its resolution failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProject {
    pub name: String,
    pub location: PathBuf,
    pub reason: String,
}

/// Repository-wide result of one resolution run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeDetails {
    pub root_path: PathBuf,
    pub repository: RepositoryChange,
    /// Every qualifying project, root first when it qualifies
    pub changes: Vec<ProjectChangeInformation>,
    pub changelog: String,
    pub skipped: Vec<SkippedProject>,
}

/// Pick the project whose manifest sits closest to the repository root.
///
/// Projects are stably sorted by (manifest depth, discovery index), so among
/// equally shallow manifests the one discovered first wins.
pub fn select_root_project<'a>(
    projects: &'a [ProjectDescriptor],
    root: &Path,
) -> Option<&'a ProjectDescriptor> {
    let mut ranked: Vec<(usize, usize, &ProjectDescriptor)> = projects
        .iter()
        .enumerate()
        .map(|(index, project)| (project.depth(root), index, project))
        .collect();
    ranked.sort_by_key(|&(depth, index, _)| (depth, index));
    ranked.first().map(|&(_, _, project)| project)
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
