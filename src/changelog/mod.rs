//! Changelog rendering and persistence
//!
//! - `render` - turns classified commits into grouped Markdown sections
//! - `document` - merges a new section into a persisted `CHANGELOG.md`

pub mod document;
pub mod render;

pub use document::{
    merge, merge_document, update_changelog_file, PriorChangelog, UnrecognizedChangelogPolicy,
    CHANGELOG_FILE_NAME, CHANGELOG_HEADER,
};
pub use render::{format_commit, render, Section, BREAKING_CHANGE_MARKER};
