pub mod analyzer;
pub mod boundary;
pub mod changelog;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hosting;
pub mod logger;
pub mod manifest;
pub mod resolver;
pub mod ui;
pub mod workflow;

pub use error::{Result, VersioningError};
