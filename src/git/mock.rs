use crate::error::{Result, VersioningError};
use crate::git::{CommitInfo, ReleaseWriter, SourceControl};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations.
///
/// Commits are registered per scope and returned verbatim for that scope.
/// Writer operations are recorded as strings such as `checkout:main` or
/// `push_tag:origin/v1.0.0`, and can be made to fail by operation name.
pub struct MockRepository {
    root: PathBuf,
    commits: HashMap<PathBuf, Vec<CommitInfo>>,
    failing_scopes: HashSet<PathBuf>,
    failing_operations: HashSet<String>,
    queries: Mutex<Vec<(PathBuf, Option<String>)>>,
    operations: Mutex<Vec<String>>,
}

impl MockRepository {
    /// Create a new empty mock repository rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MockRepository {
            root: root.into(),
            commits: HashMap::new(),
            failing_scopes: HashSet::new(),
            failing_operations: HashSet::new(),
            queries: Mutex::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Add a commit touching `scope`
    pub fn add_commit(&mut self, scope: impl Into<PathBuf>, info: CommitInfo) {
        self.commits.entry(scope.into()).or_default().push(info);
    }

    /// Make listing commits for `scope` fail
    pub fn fail_scope(&mut self, scope: impl Into<PathBuf>) {
        self.failing_scopes.insert(scope.into());
    }

    /// Make a writer operation fail, e.g. `commit` or `push_tag`
    pub fn fail_operation(&mut self, operation: impl Into<String>) {
        self.failing_operations.insert(operation.into());
    }

    /// Scopes and lower bounds passed to `list_commits`, in call order
    pub fn queries(&self) -> Vec<(PathBuf, Option<String>)> {
        lock(&self.queries).clone()
    }

    /// Writer operations performed so far
    pub fn operations(&self) -> Vec<String> {
        lock(&self.operations).clone()
    }

    fn record(&self, operation: &str, detail: &str) -> Result<()> {
        if self.failing_operations.contains(operation) {
            return Err(VersioningError::Git(git2::Error::from_str(&format!(
                "mock {} failed",
                operation
            ))));
        }
        let entry = if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{}:{}", operation, detail)
        };
        lock(&self.operations).push(entry);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SourceControl for MockRepository {
    fn repository_root(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn list_commits(
        &self,
        scope: &Path,
        from_ref: Option<&str>,
        _to_ref: &str,
    ) -> Result<Vec<CommitInfo>> {
        lock(&self.queries).push((scope.to_path_buf(), from_ref.map(str::to_string)));

        if self.failing_scopes.contains(scope) {
            return Err(VersioningError::Git(git2::Error::from_str(&format!(
                "cannot read history of {}",
                scope.display()
            ))));
        }

        Ok(self.commits.get(scope).cloned().unwrap_or_default())
    }
}

impl ReleaseWriter for MockRepository {
    fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.record("checkout", branch)
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage", "")
    }

    fn commit(&self, message: &str) -> Result<String> {
        self.record("commit", message)?;
        Ok(format!("{:040}", lock(&self.operations).len()))
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.record("push_branch", &format!("{}/{}", remote, branch))
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        self.record("tag", name)
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        self.record("push_tag", &format!("{}/{}", remote, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn commit(id: &str, message: &str) -> CommitInfo {
        CommitInfo {
            id: id.to_string(),
            author: "Dev <dev@example.com>".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_mock_lists_commits_per_scope() {
        let mut repo = MockRepository::new("/repo");
        repo.add_commit("src/A", commit("a1", "feat: a"));
        repo.add_commit("src/B", commit("b1", "fix: b"));

        let commits = repo
            .list_commits(Path::new("src/A"), Some("refs/tags/v1.0.0"), "HEAD")
            .unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].id, "a1");
        assert!(repo
            .list_commits(Path::new("src/C"), None, "HEAD")
            .unwrap()
            .is_empty());

        assert_eq!(
            repo.queries()[0],
            (PathBuf::from("src/A"), Some("refs/tags/v1.0.0".to_string()))
        );
    }

    #[test]
    fn test_mock_records_and_fails_operations() {
        let mut repo = MockRepository::new("/repo");
        repo.fail_operation("push_branch");

        repo.checkout_branch("release").unwrap();
        repo.stage_all().unwrap();
        assert!(repo.push_branch("origin", "release").is_err());

        assert_eq!(repo.operations(), vec!["checkout:release", "stage"]);
    }
}
