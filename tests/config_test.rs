// tests/config_test.rs
use git_versioning::changelog::UnrecognizedChangelogPolicy;
use git_versioning::config::{load_config, load_config_in, Config, FailurePolicy, CONFIG_FILE_NAME};
use git_versioning::domain::VersionBumpCategory;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
projects = ["ReverseProxy", "src/Tools/Cli"]

[conventional_commits]
unknown_type_bump = "none"

[resolution]
on_project_error = "abort"
max_parallel = 8

[changelog]
on_unrecognized = "append"

[release]
remote = "upstream"
tag_pattern = "release-{version}"
label = "rc"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.projects, vec!["ReverseProxy", "src/Tools/Cli"]);
    assert_eq!(
        config.conventional_commits.unknown_type_bump,
        VersionBumpCategory::None
    );
    assert_eq!(config.resolution.on_project_error, FailurePolicy::Abort);
    assert_eq!(config.resolution.max_parallel, 8);
    assert_eq!(
        config.changelog.on_unrecognized,
        UnrecognizedChangelogPolicy::Append
    );
    assert_eq!(config.release.remote, "upstream");
    assert_eq!(config.release.tag_pattern().unwrap().format("2.0.0"), "release-2.0.0");
    assert_eq!(config.release.label, "rc");
    // Untouched keys keep their defaults
    assert_eq!(config.release.branch_pattern, "versioning/release/{version}");
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut bad_category = NamedTempFile::new().unwrap();
    writeln!(bad_category, "[conventional_commits]\nunknown_type_bump = \"huge\"").unwrap();
    assert!(load_config(Some(bad_category.path().to_str().unwrap())).is_err());

    let mut no_placeholder = NamedTempFile::new().unwrap();
    writeln!(no_placeholder, "[release]\ntag_pattern = \"latest\"").unwrap();
    assert!(load_config(Some(no_placeholder.path().to_str().unwrap())).is_err());
}

#[test]
fn test_load_missing_explicit_path_fails() {
    assert!(load_config(Some("does/not/exist/versioning.toml")).is_err());
}

#[test]
fn test_load_from_given_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "[release]\nlabel = \"from-root\"\n",
    )
    .unwrap();

    let config = load_config_in(None, temp_dir.path()).unwrap();
    assert_eq!(config.release.label, "from-root");

    // An explicit path still wins
    let mut explicit = NamedTempFile::new().unwrap();
    writeln!(explicit, "[release]\nlabel = \"explicit\"").unwrap();
    let config = load_config_in(Some(explicit.path().to_str().unwrap()), temp_dir.path()).unwrap();
    assert_eq!(config.release.label, "explicit");
}

#[test]
#[serial]
fn test_load_from_working_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "[release]\nlabel = \"from-cwd\"\n",
    )
    .unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(temp_dir.path()).unwrap();
    let result = load_config(None);
    env::set_current_dir(original_dir).unwrap();

    assert_eq!(result.unwrap().release.label, "from-cwd");
}

#[test]
#[serial]
fn test_load_without_local_file() {
    let temp_dir = TempDir::new().unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(temp_dir.path()).unwrap();
    let result = load_config(None);
    env::set_current_dir(original_dir).unwrap();

    // Falls back to the user config file when present, otherwise defaults
    let config = result.unwrap();
    let user_file = dirs::config_dir().map(|dir| dir.join(format!(".{}", CONFIG_FILE_NAME)));
    if !user_file.is_some_and(|path| path.exists()) {
        assert_eq!(config, Config::default());
    }
}
