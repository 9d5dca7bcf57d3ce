use crate::error::{Result, VersioningError};
use regex::Regex;
use std::sync::LazyLock;

static LOOSE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("loose version pattern is valid")
});

/// Coerce a loosely formatted name such as `v5.0.4`, `release-2.1` or `7`
/// into a version, taking the first numeric run.
///
/// Missing components default to zero; prerelease and build parts are
/// dropped. Returns `None` when the name holds no number.
pub fn coerce_version(name: &str) -> Option<semver::Version> {
    let captures = LOOSE_VERSION.captures(name)?;
    let component = |i: usize| -> Option<u64> {
        match captures.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(semver::Version::new(component(1)?, component(2)?, component(3)?))
}

/// Naming pattern with a `{version}` placeholder.
///
/// Used for release tags (`v{version}`) and release-candidate branches
/// (`versioning/release/{version}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new pattern; it must contain exactly one `{version}` placeholder
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.matches("{version}").count() != 1 {
            return Err(VersioningError::config(format!(
                "Pattern '{}' must contain exactly one {{version}} placeholder",
                pattern
            )));
        }
        Ok(TagPattern { pattern })
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace("{version}", version)
    }

    /// Extract the `x.y.z` version from a name produced by this pattern.
    ///
    /// Returns `None` when the name does not match.
    pub fn extract_version(&self, name: &str) -> Option<semver::Version> {
        let escaped = regex::escape(&self.pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(\d+\.\d+\.\d+)");
        let re = Regex::new(&format!("^{}$", regex_pattern)).ok()?;
        let captures = re.captures(name)?;
        semver::Version::parse(captures.get(1)?.as_str()).ok()
    }
}
