//! Analysis engine for determining version bumps from commits

pub mod version_analyzer;

pub use version_analyzer::{
    aggregate, aggregate_with, classify, classify_with, ClassificationPolicy, VersionAnalyzer,
    UNKNOWN_TYPE_BUMP,
};
