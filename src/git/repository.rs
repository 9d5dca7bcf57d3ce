use crate::error::{Result, VersioningError};
use crate::git::{CommitInfo, ReleaseWriter, SourceControl};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, DiffOptions, IndexAddOption, Repository as Git2Repo, Sort, Tree};
use std::path::{Path, PathBuf};

/// `git2`-backed implementation of [SourceControl] and [ReleaseWriter].
///
/// Only the working tree root is stored. Every call opens its own
/// `git2::Repository` handle, so one instance can be shared by the
/// resolver's worker threads.
#[derive(Debug, Clone)]
pub struct Git2Repository {
    root: PathBuf,
}

impl Git2Repository {
    /// Open or discover a git repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let root = repo
            .workdir()
            .ok_or_else(|| git2::Error::from_str("bare repositories are not supported"))?
            .to_path_buf();

        Ok(Git2Repository { root })
    }

    fn repo(&self) -> Result<Git2Repo> {
        Ok(Git2Repo::open(&self.root)?)
    }
}

impl SourceControl for Git2Repository {
    fn repository_root(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn list_commits(
        &self,
        scope: &Path,
        from_ref: Option<&str>,
        to_ref: &str,
    ) -> Result<Vec<CommitInfo>> {
        let repo = self.repo()?;

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let head = repo.revparse_single(to_ref)?.peel_to_commit()?;
        revwalk.push(head.id())?;

        if let Some(from_ref) = from_ref {
            let base = repo.revparse_single(from_ref)?.peel_to_commit()?;
            revwalk.hide(base.id())?;
        }

        let pathspec = pathspec(scope);
        let mut commits = Vec::new();

        for oid_result in revwalk {
            let commit = repo.find_commit(oid_result?)?;

            if let Some(pathspec) = pathspec.as_deref() {
                if !touches(&repo, &commit, pathspec)? {
                    continue;
                }
            }

            commits.push(commit_info(&commit)?);
        }

        tracing::debug!(
            scope = %scope.display(),
            from = from_ref.unwrap_or("<root>"),
            to = to_ref,
            count = commits.len(),
            "listed commits"
        );

        Ok(commits)
    }
}

impl ReleaseWriter for Git2Repository {
    fn checkout_branch(&self, branch: &str) -> Result<()> {
        let repo = self.repo()?;
        let head = repo.head()?;

        // Forcing the branch that is already checked out is rejected by libgit2
        if head.is_branch() && head.shorthand() == Some(branch) {
            return Ok(());
        }

        let commit = head.peel_to_commit()?;
        repo.branch(branch, &commit, true)?;
        repo.set_head(&format!("refs/heads/{}", branch))?;

        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let repo = self.repo()?;
        let mut index = repo.index()?;

        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let repo = self.repo()?;
        let signature = repo.signature()?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let parent = repo.head()?.peel_to_commit()?;

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(oid.to_string())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("+refs/heads/{}:refs/heads/{}", branch, branch);
        self.push(remote, &refspec)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let repo = self.repo()?;
        let head = repo.head()?.peel_to_commit()?;
        repo.tag_lightweight(name, head.as_object(), true)?;

        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let refspec = format!("+refs/tags/{}:refs/tags/{}", name, name);
        self.push(remote, &refspec)
    }
}

impl Git2Repository {
    fn push(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let repo = self.repo()?;
        let mut remote = repo.find_remote(remote_name).map_err(|e| {
            VersioningError::Git(git2::Error::from_str(&format!(
                "Remote '{}' not found: {}",
                remote_name, e
            )))
        })?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => {
                tracing::warn!("remote rejected {}: {}", refname, status);
                Err(git2::Error::from_str(&format!(
                    "Push rejected for {}: {}",
                    refname, status
                )))
            }
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| {
                let context = if e.class() == git2::ErrorClass::Net {
                    "Network error during push"
                } else {
                    "Push failed"
                };
                VersioningError::Git(git2::Error::from_str(&format!(
                    "{} ({} -> {}): {}",
                    context, refspec, remote_name, e
                )))
            })?;

        tracing::info!(remote = remote_name, refspec, "pushed");
        Ok(())
    }
}

/// Credential lookup: SSH keys from `~/.ssh`, then the SSH agent, then the
/// default credential helper.
fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

/// Pathspec for a scope relative to the root, `None` for the whole tree
fn pathspec(scope: &Path) -> Option<String> {
    let spec = scope.to_string_lossy().replace('\\', "/");
    let spec = spec.trim_start_matches("./").trim_matches('/');
    if spec.is_empty() || spec == "." {
        None
    } else {
        Some(spec.to_string())
    }
}

/// Whether `commit` changes anything under `pathspec`.
///
/// A merge counts only when it differs from every parent, so a merge that
/// just carries one side's changes into the folder is left out the same way
/// `git log -- <path>` leaves it out.
fn touches(repo: &Git2Repo, commit: &Commit<'_>, pathspec: &str) -> Result<bool> {
    let tree = commit.tree()?;
    if commit.parent_count() == 0 {
        return differs(repo, None, &tree, pathspec);
    }

    for parent in commit.parents() {
        if !differs(repo, Some(&parent.tree()?), &tree, pathspec)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn differs(repo: &Git2Repo, old: Option<&Tree<'_>>, new: &Tree<'_>, pathspec: &str) -> Result<bool> {
    let mut options = DiffOptions::new();
    options.pathspec(pathspec);

    let diff = repo.diff_tree_to_tree(old, Some(new), Some(&mut options))?;
    Ok(diff.deltas().len() > 0)
}

fn commit_info(commit: &Commit<'_>) -> Result<CommitInfo> {
    let author = commit.author();
    let when = author.when();

    let offset = FixedOffset::east_opt(when.offset_minutes() * 60)
        .ok_or_else(|| git2::Error::from_str("commit has an invalid timezone offset"))?;
    let timestamp: DateTime<FixedOffset> = DateTime::from_timestamp(when.seconds(), 0)
        .ok_or_else(|| git2::Error::from_str("commit has an invalid timestamp"))?
        .with_timezone(&offset);

    Ok(CommitInfo {
        id: commit.id().to_string(),
        author: format!(
            "{} <{}>",
            author.name().unwrap_or("unknown"),
            author.email().unwrap_or("")
        ),
        timestamp,
        message: commit.message().unwrap_or_default().trim().to_string(),
    })
}
