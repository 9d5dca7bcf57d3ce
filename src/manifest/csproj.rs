use crate::config::Config;
use crate::domain::ProjectDescriptor;
use crate::error::{Result, VersioningError};
use crate::manifest::{ManifestWriter, ProjectDiscovery};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Version assumed for manifests that do not declare one
pub const DEFAULT_MANIFEST_VERSION: &str = "1.0.0";

const MANIFEST_EXTENSION: &str = "csproj";

/// Build output directories never hold source manifests
const IGNORED_DIRECTORIES: [&str; 2] = ["bin", "obj"];

static PROJECT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Project\b[^>]*>").expect("project pattern is valid"));

static PROPERTY_GROUP_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<PropertyGroup\b[^>/]*>").expect("property group pattern is valid")
});

/// `.csproj` discovery and version stamping.
///
/// Only the version-declaring elements are touched: the rest of the file is
/// preserved byte for byte.
#[derive(Debug, Clone, Default)]
pub struct CsprojManifests {
    projects: Vec<String>,
}

impl CsprojManifests {
    /// `projects` lists directories holding `<name>/<name>.csproj`; empty
    /// means every `*.csproj` in the repository
    pub fn new(projects: Vec<String>) -> Self {
        CsprojManifests { projects }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.projects.clone())
    }

    fn configured(&self, root: &Path) -> Vec<PathBuf> {
        self.projects
            .iter()
            .map(|project| {
                let name = Path::new(project)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| project.clone());
                root.join(project)
                    .join(format!("{}.{}", name, MANIFEST_EXTENSION))
            })
            .collect()
    }
}

impl ProjectDiscovery for CsprojManifests {
    fn discover(&self, root: &Path) -> Result<Vec<ProjectDescriptor>> {
        let candidates = if self.projects.is_empty() {
            glob_manifests(root)?
        } else {
            self.configured(root)
        };

        let mut projects = Vec::with_capacity(candidates.len());
        for manifest in candidates {
            if !manifest.exists() {
                tracing::warn!("project file not found at {}", manifest.display());
                continue;
            }
            match self.read_project(&manifest, root) {
                Ok(project) => projects.push(project),
                Err(e) => tracing::warn!("skipping unreadable project file: {}", e),
            }
        }

        tracing::debug!(count = projects.len(), root = %root.display(), "discovered projects");
        Ok(projects)
    }

    fn read_project(&self, manifest: &Path, root: &Path) -> Result<ProjectDescriptor> {
        let content = fs::read_to_string(manifest)
            .map_err(|e| VersioningError::manifest(manifest, e.to_string()))?;

        if !PROJECT_OPEN.is_match(&content) {
            return Err(VersioningError::manifest(
                manifest,
                "missing <Project> element",
            ));
        }

        let name = element_text(&content, "AssemblyName").unwrap_or_else(|| {
            manifest
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let version = element_text(&content, "Version")
            .unwrap_or_else(|| DEFAULT_MANIFEST_VERSION.to_string());

        Ok(ProjectDescriptor::new(name, version, manifest, root))
    }
}

impl ManifestWriter for CsprojManifests {
    fn set_version(
        &self,
        manifest: &Path,
        version: &str,
        suffix: Option<&str>,
        build_number: Option<&str>,
    ) -> Result<()> {
        let content = fs::read_to_string(manifest)
            .map_err(|e| VersioningError::manifest(manifest, e.to_string()))?;

        let package_version = match suffix.filter(|s| !s.is_empty()) {
            Some(suffix) => format!("{}-{}", version, suffix),
            None => version.to_string(),
        };
        let assembly_version = format!(
            "{}.{}",
            version,
            build_number.filter(|b| !b.is_empty()).unwrap_or("0")
        );

        let updated = stamp_versions(&content, &package_version, &assembly_version)
            .map_err(|message| VersioningError::manifest(manifest, message))?;
        fs::write(manifest, updated)?;

        tracing::info!(
            manifest = %manifest.display(),
            version = %package_version,
            assembly_version = %assembly_version,
            "manifest updated"
        );
        Ok(())
    }
}

/// Every manifest below `dir`, sorted, skipping build output directories
fn glob_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        MANIFEST_EXTENSION
    );

    let entries =
        glob::glob(&pattern).map_err(|e| VersioningError::config(format!("{}: {}", pattern, e)))?;

    let mut manifests = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if !in_ignored_directory(&path, dir) => manifests.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("cannot read {}: {}", e.path().display(), e.error()),
        }
    }
    manifests.sort();
    Ok(manifests)
}

fn in_ignored_directory(path: &Path, base: &Path) -> bool {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .any(|c| match c {
            Component::Normal(name) => IGNORED_DIRECTORIES
                .iter()
                .any(|ignored| name == std::ffi::OsStr::new(ignored)),
            _ => false,
        })
}

/// Trimmed text of the first `<element>` in `content`
fn element_text(content: &str, element: &str) -> Option<String> {
    let re = Regex::new(&format!(r"<{0}>\s*([^<]*?)\s*</{0}>", element)).ok()?;
    re.captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|text| !text.is_empty())
}

/// Set `<Version>` and `<AssemblyVersion>`, inserting them into the first
/// `<PropertyGroup>` (created when missing) if they are not declared yet
fn stamp_versions(
    content: &str,
    package_version: &str,
    assembly_version: &str,
) -> std::result::Result<String, String> {
    if !PROJECT_OPEN.is_match(content) {
        return Err("missing <Project> element".to_string());
    }

    let mut updated = content.to_string();
    if !PROPERTY_GROUP_OPEN.is_match(&updated) {
        let close = updated
            .rfind("</Project>")
            .ok_or_else(|| "missing </Project> closing tag".to_string())?;
        updated.insert_str(close, "  <PropertyGroup>\n  </PropertyGroup>\n");
    }

    let updated = upsert_element(&updated, "Version", package_version);
    let updated = upsert_element(&updated, "AssemblyVersion", assembly_version);
    Ok(updated)
}

fn upsert_element(content: &str, element: &str, value: &str) -> String {
    let existing = Regex::new(&format!(r"<{0}>[^<]*</{0}>", element))
        .ok()
        .and_then(|re| re.find(content).map(|m| m.range()));
    let replacement = format!("<{0}>{1}</{0}>", element, value);

    match existing {
        Some(range) => {
            let mut updated = content.to_string();
            updated.replace_range(range, &replacement);
            updated
        }
        None => match PROPERTY_GROUP_OPEN.find(content) {
            Some(open) => {
                let mut updated = content.to_string();
                updated.insert_str(open.end(), &format!("\n    {}", replacement));
                updated
            }
            None => content.to_string(),
        },
    }
}
