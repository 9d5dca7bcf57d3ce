//! Project manifests: discovery and version updates
//!
//! [ProjectDiscovery] finds the projects of a repository and reads their
//! declared name and version; [ManifestWriter] stamps a release version back
//! into a manifest. [CsprojManifests] implements both for `.csproj` files.

pub mod csproj;

pub use csproj::CsprojManifests;

use crate::domain::ProjectDescriptor;
use crate::error::Result;
use std::path::Path;

/// Finds projects and reads their manifests.
///
/// Discovery order is significant: it breaks ties when choosing the root
/// project and orders the change report.
pub trait ProjectDiscovery: Send + Sync {
    /// All readable projects under `root`, in a stable order.
    ///
    /// Missing or unreadable manifests are logged and left out.
    fn discover(&self, root: &Path) -> Result<Vec<ProjectDescriptor>>;

    /// Read a single manifest
    fn read_project(&self, manifest: &Path, root: &Path) -> Result<ProjectDescriptor>;
}

/// Writes release versions into manifests
pub trait ManifestWriter {
    /// Set the package version to `version[-suffix]` and the assembly version
    /// to `version.<build_number>` (`0` when absent).
    fn set_version(
        &self,
        manifest: &Path,
        version: &str,
        suffix: Option<&str>,
        build_number: Option<&str>,
    ) -> Result<()>;
}
