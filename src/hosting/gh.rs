use crate::config::ReleaseConfig;
use crate::domain::coerce_version;
use crate::error::{Result, VersioningError};
use crate::hosting::{PullRequest, ReleaseHost, Upsert};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

/// Label attached to release-candidate pull requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl From<&ReleaseConfig> for LabelSpec {
    fn from(config: &ReleaseConfig) -> Self {
        LabelSpec {
            name: config.label.clone(),
            color: config.label_color.clone(),
            description: config.label_description.clone(),
        }
    }
}

/// [ReleaseHost] backed by the GitHub CLI.
///
/// `gh` resolves the repository from the directory it runs in, so point it
/// at the repository root with [GhCli::with_working_dir]. Credentials come
/// from its own login state.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    working_dir: Option<PathBuf>,
    label: LabelSpec,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    draft: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoView {
    name_with_owner: String,
}

impl GhCli {
    pub fn new(label: LabelSpec) -> Self {
        GhCli {
            program: "gh".to_string(),
            working_dir: None,
            label,
        }
    }

    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self::new(LabelSpec::from(config))
    }

    /// Use a different executable, e.g. a wrapper script
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run `gh` inside `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run `gh` and return its trimmed stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(program = %self.program, command = ?args.iter().take(2).collect::<Vec<_>>(), "running");

        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VersioningError::command(&self.program, args, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn repository_name(&self) -> Result<String> {
        let json = self.run(&["repo", "view", "--json", "nameWithOwner"])?;
        let view: RepoView = serde_json::from_str(&json)?;
        Ok(view.name_with_owner)
    }

    fn find_pull_request(&self, head_ref: &str) -> Result<Option<u64>> {
        let json = self.run(&["pr", "list", "--head", head_ref, "--json", "number,headRefName"])?;
        let prs: Vec<PullRequest> = serde_json::from_str(&json)?;
        Ok(prs
            .into_iter()
            .find(|pr| pr.head_ref_name == head_ref)
            .map(|pr| pr.number))
    }

    /// Create or refresh the label; failing here only costs the label
    fn ensure_label(&self) {
        let result = self.run(&[
            "label",
            "create",
            &self.label.name,
            "--color",
            &self.label.color,
            "--description",
            &self.label.description,
            "--force",
        ]);
        if let Err(e) = result {
            tracing::warn!("could not create or update label '{}': {}", self.label.name, e);
        }
    }

    fn release_exists(&self, tag: &str) -> bool {
        self.run(&["release", "view", tag, "--json", "name"]).is_ok()
    }
}

impl ReleaseHost for GhCli {
    fn latest_release_tag(&self) -> Result<Option<String>> {
        let repository = self.repository_name()?;
        let json = self.run(&[
            "api",
            "--paginate",
            &format!("/repos/{}/releases", repository),
        ])?;
        latest_published_tag(&json)
    }

    fn create_or_update_pull_request(
        &self,
        head_ref: &str,
        title: &str,
        body: &str,
    ) -> Result<Upsert> {
        let existing = self.find_pull_request(head_ref)?;
        self.ensure_label();

        match existing {
            Some(number) => {
                let number = number.to_string();
                self.run(&[
                    "pr",
                    "edit",
                    &number,
                    "--title",
                    title,
                    "--body",
                    body,
                    "--add-label",
                    &self.label.name,
                ])?;
                tracing::info!("updated pull request #{} for {}", number, head_ref);
                Ok(Upsert::Updated)
            }
            None => {
                self.run(&[
                    "pr",
                    "create",
                    "--head",
                    head_ref,
                    "--title",
                    title,
                    "--body",
                    body,
                    "--label",
                    &self.label.name,
                ])?;
                tracing::info!("created pull request for {}", head_ref);
                Ok(Upsert::Created)
            }
        }
    }

    fn create_or_update_release(&self, tag: &str, notes: &str, draft: bool) -> Result<Upsert> {
        let draft_flag = format!("--draft={}", draft);
        let (action, upsert) = if self.release_exists(tag) {
            ("edit", Upsert::Updated)
        } else {
            ("create", Upsert::Created)
        };

        self.run(&[
            "release",
            action,
            tag,
            "--title",
            tag,
            "--notes",
            notes,
            &draft_flag,
        ])?;
        tracing::info!(tag, draft, ?upsert, "release saved");
        Ok(upsert)
    }

    fn promote_release(&self, tag: &str) -> Result<()> {
        self.run(&["release", "edit", tag, "--draft=false"])?;
        Ok(())
    }

    fn dispatch_workflow(&self, workflow: &str) -> Result<()> {
        self.run(&["workflow", "run", workflow])?;
        Ok(())
    }

    fn release_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let json = self.run(&[
            "pr",
            "list",
            "--state",
            "open",
            "--label",
            &self.label.name,
            "--json",
            "number,headRefName",
        ])?;
        Ok(serde_json::from_str(&json)?)
    }

    fn close_pull_request(&self, number: u64, comment: &str) -> Result<()> {
        let number = number.to_string();
        self.run(&["pr", "close", &number, "--comment", comment, "--delete-branch"])?;
        Ok(())
    }
}

/// Pick the highest non-draft release from a paginated `/releases` payload.
///
/// `gh api --paginate` prints one JSON array per page back to back. Releases
/// whose tag holds no version are ignored.
fn latest_published_tag(json: &str) -> Result<Option<String>> {
    let mut releases = Vec::new();
    for page in serde_json::Deserializer::from_str(json).into_iter::<Vec<Release>>() {
        releases.extend(page?);
    }

    Ok(releases
        .into_iter()
        .filter(|release| !release.draft)
        .filter_map(|release| coerce_version(&release.tag_name).map(|v| (v, release.tag_name)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag))
}
