use crate::error::{Result, VersioningError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic-version increment implied by a commit or a set of commits.
///
/// Variants are declared in ascending severity so the derived `Ord` matches
/// the rank order `none < patch < minor < major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VersionBumpCategory {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl VersionBumpCategory {
    /// All categories in rank order
    pub const ALL: [VersionBumpCategory; 4] = [
        VersionBumpCategory::None,
        VersionBumpCategory::Patch,
        VersionBumpCategory::Minor,
        VersionBumpCategory::Major,
    ];

    /// Integer rank of the category (0 for none through 3 for major)
    pub fn rank(self) -> u8 {
        match self {
            VersionBumpCategory::None => 0,
            VersionBumpCategory::Patch => 1,
            VersionBumpCategory::Minor => 2,
            VersionBumpCategory::Major => 3,
        }
    }

    /// Convert a rank back into a category.
    ///
    /// # Errors
    /// Returns [`VersioningError::InvalidRank`] for any rank above 3.
    pub fn from_rank(rank: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(rank))
            .copied()
            .ok_or(VersioningError::InvalidRank(rank))
    }

    /// Lowercase name used in config files and reports
    pub fn as_str(self) -> &'static str {
        match self {
            VersionBumpCategory::None => "none",
            VersionBumpCategory::Patch => "patch",
            VersionBumpCategory::Minor => "minor",
            VersionBumpCategory::Major => "major",
        }
    }
}

impl fmt::Display for VersionBumpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionBumpCategory {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(VersionBumpCategory::None),
            "patch" => Ok(VersionBumpCategory::Patch),
            "minor" => Ok(VersionBumpCategory::Minor),
            "major" => Ok(VersionBumpCategory::Major),
            other => Err(VersioningError::version(format!(
                "Unknown version bump category: '{}'",
                other
            ))),
        }
    }
}

/// Increment a semantic version string by the given category.
///
/// Prerelease versions are released rather than bumped when the requested
/// component is already the one the prerelease leads up to, so `1.0.0-rc.1`
/// becomes `1.0.0` on a patch bump and `1.2.0-beta` becomes `1.2.0` on a
/// minor bump. Build metadata is dropped. A `None` bump returns the input
/// unchanged.
///
/// # Errors
/// Returns a version error if `current` is not a valid semantic version.
pub fn increment(current: &str, bump: VersionBumpCategory) -> Result<String> {
    if bump == VersionBumpCategory::None {
        return Ok(current.to_string());
    }

    let mut version = semver::Version::parse(current.trim().trim_start_matches(['v', 'V']))
        .map_err(|e| VersioningError::version(format!("Invalid version '{}': {}", current, e)))?;
    let is_prerelease = !version.pre.is_empty();

    match bump {
        VersionBumpCategory::Major => {
            if version.minor != 0 || version.patch != 0 || !is_prerelease {
                version.major += 1;
            }
            version.minor = 0;
            version.patch = 0;
        }
        VersionBumpCategory::Minor => {
            if version.patch != 0 || !is_prerelease {
                version.minor += 1;
            }
            version.patch = 0;
        }
        VersionBumpCategory::Patch => {
            if !is_prerelease {
                version.patch += 1;
            }
        }
        VersionBumpCategory::None => {}
    }

    version.pre = semver::Prerelease::EMPTY;
    version.build = semver::BuildMetadata::EMPTY;
    Ok(version.to_string())
}
