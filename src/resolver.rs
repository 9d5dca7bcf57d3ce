//! Change-set resolution across every project of a repository
//!
//! The resolver discovers projects, picks the root project, looks up the
//! latest published release once, then resolves each project on a bounded
//! pool of scoped worker threads. Results are put back in discovery order
//! before filtering, so the report does not depend on scheduling.

use crate::analyzer::{ClassificationPolicy, VersionAnalyzer};
use crate::changelog;
use crate::config::{Config, FailurePolicy};
use crate::domain::{
    increment, select_root_project, ChangeDetails, ConventionalCommit, ProjectChangeInformation,
    ProjectDescriptor, RepositoryChange, SkippedProject, VersionBumpCategory,
};
use crate::error::{Result, VersioningError};
use crate::git::SourceControl;
use crate::hosting::ReleaseHost;
use crate::manifest::ProjectDiscovery;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Upper bound of history walked for each project
const HEAD: &str = "HEAD";

/// Heading of the repository-wide changelog
pub const CHANGES_HEADER: &str = "# Changes\n\n";

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOptions {
    pub failure_policy: FailurePolicy,
    /// Projects resolved concurrently; values below 1 are treated as 1
    pub max_parallel: usize,
    pub classification: ClassificationPolicy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            failure_policy: FailurePolicy::default(),
            max_parallel: 4,
            classification: ClassificationPolicy::default(),
        }
    }
}

impl From<&Config> for ResolverOptions {
    fn from(config: &Config) -> Self {
        ResolverOptions {
            failure_policy: config.resolution.on_project_error,
            max_parallel: config.resolution.max_parallel,
            classification: ClassificationPolicy::from(&config.conventional_commits),
        }
    }
}

pub struct ChangeSetResolver<'a> {
    source: &'a dyn SourceControl,
    discovery: &'a dyn ProjectDiscovery,
    host: &'a dyn ReleaseHost,
    options: ResolverOptions,
    analyzer: VersionAnalyzer,
}

impl<'a> ChangeSetResolver<'a> {
    pub fn new(
        source: &'a dyn SourceControl,
        discovery: &'a dyn ProjectDiscovery,
        host: &'a dyn ReleaseHost,
        options: ResolverOptions,
    ) -> Self {
        let analyzer = VersionAnalyzer::new(options.classification);
        ChangeSetResolver {
            source,
            discovery,
            host,
            options,
            analyzer,
        }
    }

    /// Compute the change details of the repository.
    ///
    /// With `bump_version` unset every `next_version` equals the declared
    /// version; classification and changelogs are computed either way.
    ///
    /// # Returns
    /// * `Ok(None)` - No projects, or no project has a releasable change
    /// * `Ok(Some(details))` - At least one project qualifies
    /// * `Err` - Discovery, the release lookup or the root project failed, or
    ///   any project failed under [FailurePolicy::Abort]
    pub fn resolve(&self, bump_version: bool) -> Result<Option<ChangeDetails>> {
        let root_path = self.source.repository_root()?;
        let projects = self.discovery.discover(&root_path)?;

        let Some(root_project) = select_root_project(&projects, &root_path) else {
            tracing::info!("no projects found under {}", root_path.display());
            return Ok(None);
        };
        let root_index = projects
            .iter()
            .position(|p| std::ptr::eq(p, root_project))
            .unwrap_or_default();
        tracing::debug!(root = %root_project.name, count = projects.len(), "resolving projects");

        let latest = self.host.latest_release_tag()?;
        match &latest {
            Some(tag) => tracing::info!("latest release: {}", tag),
            None => tracing::info!("no published release, using full history"),
        }
        let from_ref = latest.map(|tag| format!("refs/tags/{}", tag));

        let results = self.resolve_all(&projects, from_ref.as_deref(), bump_version);

        let mut resolved: Vec<(usize, ProjectChangeInformation)> = Vec::with_capacity(projects.len());
        let mut skipped = Vec::new();
        for (index, (project, result)) in projects.iter().zip(results).enumerate() {
            match result {
                Ok(change) => resolved.push((index, change)),
                Err(e) if index == root_index => return Err(e),
                Err(e) if self.options.failure_policy == FailurePolicy::Abort => return Err(e),
                Err(e) => {
                    tracing::warn!("skipping project {}: {}", project.name, e);
                    skipped.push(SkippedProject {
                        name: project.name.clone(),
                        location: project.location.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let Some(position) = resolved.iter().position(|(index, _)| *index == root_index) else {
            return Err(VersioningError::project(
                &root_project.name,
                "root project was not resolved",
            ));
        };
        let (_, root_change) = resolved.remove(position);

        let mut changes = Vec::with_capacity(resolved.len() + 1);
        if root_change.qualifies() {
            changes.push(root_change.clone());
        }
        changes.extend(
            resolved
                .into_iter()
                .map(|(_, change)| change)
                .filter(ProjectChangeInformation::qualifies),
        );

        if changes.is_empty() {
            tracing::info!("no changes found");
            return Ok(None);
        }

        let changelog = repository_changelog(&changes);
        Ok(Some(ChangeDetails {
            root_path,
            repository: RepositoryChange {
                change: root_change,
            },
            changes,
            changelog,
            skipped,
        }))
    }

    /// Resolve every project, returning one result per project in discovery order
    fn resolve_all(
        &self,
        projects: &[ProjectDescriptor],
        from_ref: Option<&str>,
        bump_version: bool,
    ) -> Vec<Result<ProjectChangeInformation>> {
        let workers = self.options.max_parallel.clamp(1, projects.len().max(1));
        let next = AtomicUsize::new(0);
        let halted = AtomicBool::new(false);
        let abort_on_error = self.options.failure_policy == FailurePolicy::Abort;

        let mut slots: Vec<Option<Result<ProjectChangeInformation>>> =
            projects.iter().map(|_| None).collect();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut finished = Vec::new();
                        while !halted.load(Ordering::Acquire) {
                            let index = next.fetch_add(1, Ordering::AcqRel);
                            let Some(project) = projects.get(index) else {
                                break;
                            };
                            let result = self.resolve_project(project, from_ref, bump_version);
                            if result.is_err() && abort_on_error {
                                halted.store(true, Ordering::Release);
                            }
                            finished.push((index, result));
                        }
                        finished
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(finished) => {
                        for (index, result) in finished {
                            slots[index] = Some(result);
                        }
                    }
                    Err(_) => tracing::error!("a resolver worker panicked"),
                }
            }
        });

        // Slots are only empty after a halt or a worker panic
        projects
            .iter()
            .zip(slots)
            .map(|(project, slot)| {
                slot.unwrap_or_else(|| {
                    Err(VersioningError::project(&project.name, "resolution did not complete"))
                })
            })
            .collect()
    }

    fn resolve_project(
        &self,
        project: &ProjectDescriptor,
        from_ref: Option<&str>,
        bump_version: bool,
    ) -> Result<ProjectChangeInformation> {
        let mut commits = self
            .source
            .list_commits(&project.location, from_ref, HEAD)
            .map_err(|e| VersioningError::project(&project.name, e.to_string()))?;
        commits.sort_by_key(|commit| commit.timestamp);

        let conventional: Vec<ConventionalCommit> = commits
            .iter()
            .map(|commit| ConventionalCommit::parse(&commit.message))
            .collect();
        let version_type = self.analyzer.aggregate(&conventional);

        let next_version = if bump_version && version_type != VersionBumpCategory::None {
            increment(&project.version, version_type)
                .map_err(|e| VersioningError::project(&project.name, e.to_string()))?
        } else {
            project.version.clone()
        };

        let changelog = (version_type != VersionBumpCategory::None).then(|| {
            format!(
                "## {}: v{}\n\n{}",
                project.name,
                next_version,
                changelog::render(&conventional)
            )
        });

        tracing::debug!(
            project = %project.name,
            commits = commits.len(),
            %version_type,
            next = %next_version,
            "project resolved"
        );

        Ok(ProjectChangeInformation {
            name: project.name.clone(),
            location: project.location.clone(),
            manifest: project.path.clone(),
            version: project.version.clone(),
            next_version,
            commits,
            version_type,
            changelog,
        })
    }
}

/// Join the per-project changelog blocks under [CHANGES_HEADER]
pub fn repository_changelog(changes: &[ProjectChangeInformation]) -> String {
    let blocks: Vec<&str> = changes
        .iter()
        .filter_map(|change| change.changelog.as_deref())
        .collect();
    format!("{}{}\n", CHANGES_HEADER, blocks.join("\n\n"))
}

/// Location of a change relative to the repository root, `.` for the root itself
pub fn display_location(location: &Path) -> String {
    if location.as_os_str().is_empty() {
        ".".to_string()
    } else {
        location.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{CommitInfo, MockRepository};
    use crate::hosting::mock::MockHost;
    use chrono::DateTime;
    use std::path::PathBuf;

    struct StaticDiscovery {
        projects: Vec<(&'static str, &'static str, &'static str)>,
    }

    impl ProjectDiscovery for StaticDiscovery {
        fn discover(&self, root: &Path) -> Result<Vec<ProjectDescriptor>> {
            Ok(self
                .projects
                .iter()
                .map(|(name, version, manifest)| {
                    ProjectDescriptor::new(*name, *version, root.join(manifest), root)
                })
                .collect())
        }

        fn read_project(&self, manifest: &Path, _root: &Path) -> Result<ProjectDescriptor> {
            Err(VersioningError::manifest(manifest, "not supported"))
        }
    }

    fn commit(id: &str, minute: u32, message: &str) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            author: "Dev <dev@example.com>".to_string(),
            timestamp: DateTime::parse_from_rfc3339(&format!("2024-03-01T10:{:02}:00+00:00", minute))
                .unwrap(),
            message: message.to_string(),
        }
    }

    fn discovery(projects: Vec<(&'static str, &'static str, &'static str)>) -> StaticDiscovery {
        StaticDiscovery { projects }
    }

    fn resolve(
        repo: &MockRepository,
        discovery: &StaticDiscovery,
        host: &MockHost,
        options: ResolverOptions,
    ) -> Result<Option<ChangeDetails>> {
        ChangeSetResolver::new(repo, discovery, host, options).resolve(true)
    }

    #[test]
    fn test_single_project_feat_and_fix() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("App", commit("b", 2, "fix: handle empty input"));
        repo.add_commit("App", commit("a", 1, "feat: add export"));
        let projects = discovery(vec![("App", "1.0.0", "App/App.csproj")]);
        let host = MockHost::default();

        let details = resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .unwrap();

        let change = &details.repository.change;
        assert_eq!(change.version_type, VersionBumpCategory::Minor);
        assert_eq!(change.next_version, "1.1.0");
        let ids: Vec<&str> = change.commits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(details.changes.len(), 1);
        assert_eq!(
            details.changelog,
            "# Changes\n\n## App: v1.1.0\n\n### Features\n\n- Add export\n\n### Bug Fixes\n\n- Handle empty input\n\n"
        );
        assert!(details.skipped.is_empty());
        assert_eq!(details.root_path, PathBuf::from("/repo"));
    }

    #[test]
    fn test_root_without_changes_stays_in_repository_change() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("", commit("r", 1, "docs: readme"));
        repo.add_commit("src/Lib", commit("l", 2, "fix: bounds"));
        let projects = discovery(vec![
            ("Lib", "0.4.1", "src/Lib/Lib.csproj"),
            ("Root", "2.0.0", "Root.csproj"),
        ]);
        let host = MockHost::default();

        let details = resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(details.repository.change.name, "Root");
        assert_eq!(details.repository.change.version_type, VersionBumpCategory::None);
        assert_eq!(details.repository.change.next_version, "2.0.0");
        assert_eq!(details.repository.change.changelog, None);

        let names: Vec<&str> = details.changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lib"]);
        assert_eq!(details.changes[0].next_version, "0.4.2");
    }

    #[test]
    fn test_root_first_then_discovery_order() {
        let mut repo = MockRepository::new("/repo");
        for scope in ["", "a", "b", "c", "d", "e", "f"] {
            repo.add_commit(scope, commit(scope, 1, "fix: something"));
        }
        let projects = discovery(vec![
            ("F", "1.0.0", "f/F.csproj"),
            ("A", "1.0.0", "a/A.csproj"),
            ("Root", "1.0.0", "Root.csproj"),
            ("E", "1.0.0", "e/E.csproj"),
            ("B", "1.0.0", "b/B.csproj"),
            ("D", "1.0.0", "d/D.csproj"),
            ("C", "1.0.0", "c/C.csproj"),
        ]);
        let host = MockHost::default();
        let options = ResolverOptions {
            max_parallel: 3,
            ..Default::default()
        };

        let details = resolve(&repo, &projects, &host, options).unwrap().unwrap();
        let names: Vec<&str> = details.changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "F", "A", "E", "B", "D", "C"]);
    }

    #[test]
    fn test_no_qualifying_changes() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("App", commit("a", 1, "chore: tidy"));
        repo.add_commit("App", commit("b", 2, "docs: typo"));
        let projects = discovery(vec![("App", "1.0.0", "App/App.csproj")]);
        let host = MockHost::default();

        assert!(resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_no_projects() {
        let repo = MockRepository::new("/repo");
        let host = MockHost::default();
        assert!(resolve(&repo, &discovery(vec![]), &host, ResolverOptions::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_commits_are_scoped_from_latest_release() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("App", commit("a", 1, "feat!: new api"));
        let projects = discovery(vec![
            ("App", "1.4.2", "App/App.csproj"),
            ("Tool", "0.1.0", "tools/Tool/Tool.csproj"),
        ]);
        let host = MockHost::with_latest("v1.4.2");

        let details = resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(details.repository.change.next_version, "2.0.0");

        let mut queries = repo.queries();
        queries.sort();
        assert_eq!(
            queries,
            vec![
                (PathBuf::from("App"), Some("refs/tags/v1.4.2".to_string())),
                (PathBuf::from("tools/Tool"), Some("refs/tags/v1.4.2".to_string())),
            ]
        );
    }

    #[test]
    fn test_without_bump_versions_are_kept() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("App", commit("a", 1, "feat: add"));
        let projects = discovery(vec![("App", "1.0.0", "App/App.csproj")]);
        let host = MockHost::default();

        let details = ChangeSetResolver::new(&repo, &projects, &host, ResolverOptions::default())
            .resolve(false)
            .unwrap()
            .unwrap();

        let change = &details.repository.change;
        assert_eq!(change.version_type, VersionBumpCategory::Minor);
        assert_eq!(change.next_version, "1.0.0");
        assert!(!change.is_bumped());
        assert!(details.changelog.starts_with("# Changes\n\n## App: v1.0.0\n\n"));
    }

    #[test]
    fn test_skip_policy_records_failed_project() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("", commit("r", 1, "feat: root"));
        repo.add_commit("Lib", commit("l", 1, "fix: lib"));
        repo.fail_scope("Broken");
        let projects = discovery(vec![
            ("Root", "1.0.0", "Root.csproj"),
            ("Broken", "1.0.0", "Broken/Broken.csproj"),
            ("Lib", "1.0.0", "Lib/Lib.csproj"),
        ]);
        let host = MockHost::default();

        let details = resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .unwrap();

        let names: Vec<&str> = details.changes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Lib"]);
        assert_eq!(details.skipped.len(), 1);
        assert_eq!(details.skipped[0].name, "Broken");
        assert_eq!(details.skipped[0].location, PathBuf::from("Broken"));
    }

    #[test]
    fn test_skip_policy_covers_invalid_versions() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("", commit("r", 1, "fix: root"));
        repo.add_commit("Odd", commit("o", 1, "fix: odd"));
        let projects = discovery(vec![
            ("Root", "1.0.0", "Root.csproj"),
            ("Odd", "next", "Odd/Odd.csproj"),
        ]);
        let host = MockHost::default();

        let details = resolve(&repo, &projects, &host, ResolverOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(details.changes.len(), 1);
        assert_eq!(details.skipped[0].name, "Odd");
    }

    #[test]
    fn test_abort_policy_fails_resolution() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("", commit("r", 1, "feat: root"));
        repo.fail_scope("Broken");
        let projects = discovery(vec![
            ("Root", "1.0.0", "Root.csproj"),
            ("Broken", "1.0.0", "Broken/Broken.csproj"),
        ]);
        let host = MockHost::default();
        let options = ResolverOptions {
            failure_policy: FailurePolicy::Abort,
            ..Default::default()
        };

        let err = resolve(&repo, &projects, &host, options).unwrap_err();
        assert!(matches!(err, VersioningError::Project { ref name, .. } if name == "Broken"));
    }

    #[test]
    fn test_root_failure_is_fatal_under_skip() {
        let mut repo = MockRepository::new("/repo");
        repo.fail_scope("");
        repo.add_commit("Lib", commit("l", 1, "fix: lib"));
        let projects = discovery(vec![
            ("Lib", "1.0.0", "Lib/Lib.csproj"),
            ("Root", "1.0.0", "Root.csproj"),
        ]);
        let host = MockHost::default();

        let err = resolve(&repo, &projects, &host, ResolverOptions::default()).unwrap_err();
        assert!(matches!(err, VersioningError::Project { ref name, .. } if name == "Root"));
    }

    #[test]
    fn test_release_lookup_failure_is_fatal() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("App", commit("a", 1, "feat: add"));
        let projects = discovery(vec![("App", "1.0.0", "App/App.csproj")]);
        let host = MockHost {
            fail_latest: true,
            ..Default::default()
        };

        assert!(matches!(
            resolve(&repo, &projects, &host, ResolverOptions::default()),
            Err(VersioningError::Command { .. })
        ));
        assert!(repo.queries().is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.resolution.on_project_error = FailurePolicy::Abort;
        config.resolution.max_parallel = 2;
        config.conventional_commits.unknown_type_bump = VersionBumpCategory::None;

        let options = ResolverOptions::from(&config);
        assert_eq!(options.failure_policy, FailurePolicy::Abort);
        assert_eq!(options.max_parallel, 2);
        assert_eq!(options.classification.unknown_type, VersionBumpCategory::None);
    }

    #[test]
    fn test_display_location() {
        assert_eq!(display_location(Path::new("")), ".");
        assert_eq!(display_location(Path::new("src/Api")), "src/Api");
    }
}
