use crate::changelog::UnrecognizedChangelogPolicy;
use crate::domain::{TagPattern, VersionBumpCategory};
use crate::error::{Result, VersioningError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "versioning.toml";

/// Represents the complete configuration for git-versioning.
///
/// Contains the project list, commit classification, resolution, changelog and release settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Project directories relative to the repository root. Each is expected to
    /// hold `<name>/<name>.csproj`. Empty means every `*.csproj` in the repository.
    #[serde(default)]
    pub projects: Vec<String>,

    #[serde(default)]
    pub conventional_commits: ConventionalCommitsConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Configuration for conventional commit classification.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConventionalCommitsConfig {
    /// Bump applied to commits with an unknown or missing type
    #[serde(default = "default_unknown_type_bump")]
    pub unknown_type_bump: VersionBumpCategory,
}

fn default_unknown_type_bump() -> VersionBumpCategory {
    crate::analyzer::UNKNOWN_TYPE_BUMP
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        ConventionalCommitsConfig {
            unknown_type_bump: default_unknown_type_bump(),
        }
    }
}

/// How a failure resolving a single project affects the whole run
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log a warning, leave the project out and keep going
    #[default]
    Skip,
    /// Fail the whole resolution on the first project error
    Abort,
}

/// Configuration for the change-set resolution.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub on_project_error: FailurePolicy,

    /// Upper bound on projects resolved concurrently
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_max_parallel() -> usize {
    4
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        ResolutionConfig {
            on_project_error: FailurePolicy::default(),
            max_parallel: default_max_parallel(),
        }
    }
}

/// Configuration for changelog persistence.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ChangelogConfig {
    /// What to do with an existing CHANGELOG.md that lacks the standard header
    #[serde(default)]
    pub on_unrecognized: UnrecognizedChangelogPolicy,
}

/// Configuration for branches, tags and the release host.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch_pattern")]
    pub branch_pattern: String,

    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    /// Used both as the commit message and the pull request title
    #[serde(default = "default_title_pattern")]
    pub title_pattern: String,

    #[serde(default = "default_label")]
    pub label: String,

    #[serde(default = "default_label_color")]
    pub label_color: String,

    #[serde(default = "default_label_description")]
    pub label_description: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch_pattern() -> String {
    "versioning/release/{version}".to_string()
}

fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

fn default_title_pattern() -> String {
    "chore: release {version}".to_string()
}

fn default_label() -> String {
    "release-candidate".to_string()
}

fn default_label_color() -> String {
    "cccccc".to_string()
}

fn default_label_description() -> String {
    "Release candidate pull requests".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            remote: default_remote(),
            branch_pattern: default_branch_pattern(),
            tag_pattern: default_tag_pattern(),
            title_pattern: default_title_pattern(),
            label: default_label(),
            label_color: default_label_color(),
            label_description: default_label_description(),
        }
    }
}

impl ReleaseConfig {
    pub fn branch_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.branch_pattern.as_str())
    }

    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.tag_pattern.as_str())
    }

    pub fn title_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.title_pattern.as_str())
    }
}

impl Config {
    /// Check values that serde cannot validate on its own
    pub fn validate(&self) -> Result<()> {
        if self.resolution.max_parallel == 0 {
            return Err(VersioningError::config(
                "resolution.max_parallel must be at least 1",
            ));
        }
        self.release.branch_pattern()?;
        self.release.tag_pattern()?;
        self.release.title_pattern()?;
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `versioning.toml` in current directory (see [load_config_in])
/// 3. `~/.config/.versioning.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    load_config_in(config_path, Path::new("."))
}

/// Same lookup as [load_config] with `dir` (usually the repository root)
/// searched for `versioning.toml` instead of the current directory
pub fn load_config_in(config_path: Option<&str>, dir: &Path) -> Result<Config> {
    let local = dir.join(CONFIG_FILE_NAME);

    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if local.exists() {
        fs::read_to_string(&local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| VersioningError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
