use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for git-versioning operations
#[derive(Error, Debug)]
pub enum VersioningError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Invalid version bump rank: {0}")]
    InvalidRank(u8),

    #[error("Manifest error in {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Command `{program} {}` failed: {stderr}", .args.join(" "))]
    Command {
        program: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("Project '{name}' could not be resolved: {message}")]
    Project { name: String, message: String },

    #[error("{step} step failed: {message}")]
    Sequence { step: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-versioning
pub type Result<T> = std::result::Result<T, VersioningError>;

impl VersioningError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersioningError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        VersioningError::Version(msg.into())
    }

    /// Create a manifest error for the given file
    pub fn manifest(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        VersioningError::Manifest {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an error for an external command that exited unsuccessfully
    pub fn command(program: &str, args: &[&str], stderr: impl Into<String>) -> Self {
        VersioningError::Command {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stderr: stderr.into(),
        }
    }

    /// Create an error for a project whose change information failed
    pub fn project(name: impl Into<String>, msg: impl Into<String>) -> Self {
        VersioningError::Project {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create an error for a failed step of a mutating git sequence
    pub fn sequence(step: impl Into<String>, msg: impl Into<String>) -> Self {
        VersioningError::Sequence {
            step: step.into(),
            message: msg.into(),
        }
    }
}
