use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use git_versioning::boundary::BoundaryWarning;
use git_versioning::config;
use git_versioning::git::{Git2Repository, SourceControl};
use git_versioning::hosting::{GhCli, Upsert};
use git_versioning::manifest::CsprojManifests;
use git_versioning::workflow::Workflow;
use git_versioning::{logger, ui};

#[derive(Parser)]
#[command(
    name = "git-versioning",
    version,
    about = "Version, changelog and release automation for multi-project repositories"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        short = 'C',
        long,
        global = true,
        help = "Path inside the repository (default: current directory)"
    )]
    repository: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the projects changed since the latest release
    Changes {
        #[arg(long, help = "Print the change details as JSON")]
        json: bool,

        #[arg(long, help = "Keep declared versions instead of computing the next ones")]
        no_bump: bool,
    },
    /// Bump versions, write changelogs and open the release-candidate pull request
    ReleaseCandidate,
    /// Bump versions and write changelogs in the working tree only
    Update {
        #[arg(long, help = "Prerelease suffix appended to the package version")]
        suffix: Option<String>,

        #[arg(long, help = "Build number used as the fourth assembly version component")]
        build_number: Option<String>,
    },
    /// Create the release for the current root version and push its tag
    CreateRelease {
        #[arg(long, help = "Create the release as a draft")]
        draft: bool,
    },
    /// Publish the draft release of a version
    Promote { version: String },
    /// Fail when a release-candidate pull request is not newer than the latest release
    CheckRc,
    /// Close release-candidate pull requests of older major versions
    CloseStale {
        #[arg(long, help = "Major version threshold (default: latest release major)")]
        below: Option<u64>,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
    /// Trigger a workflow on the hosting service
    Dispatch { workflow: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = logger::init(args.verbose) {
        eprintln!("{}", e);
    }

    let path = args.repository.unwrap_or_else(|| PathBuf::from("."));
    let repo = Git2Repository::open(&path)
        .with_context(|| format!("No git repository at {}", path.display()))?;
    let root = repo.repository_root()?;

    let config = match config::load_config_in(args.config.as_deref(), &root) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let manifests = CsprojManifests::from_config(&config);
    let host = GhCli::from_config(&config.release).with_working_dir(&root);
    let workflow = Workflow::new(&config, &repo, &repo, &manifests, &manifests, &host);

    match args.command {
        Command::Changes { json, no_bump } => show_changes(&workflow, json, !no_bump),
        Command::ReleaseCandidate => release_candidate(&workflow),
        Command::Update {
            suffix,
            build_number,
        } => update(&workflow, suffix.as_deref(), build_number.as_deref()),
        Command::CreateRelease { draft } => create_release(&workflow, draft),
        Command::Promote { version } => {
            let tag = workflow.promote(&version)?;
            ui::display_success(&format!("Promoted release {}", tag));
            Ok(())
        }
        Command::CheckRc => check_release_candidates(&workflow),
        Command::CloseStale { below, yes } => close_stale(&workflow, below, yes),
        Command::Dispatch { workflow: name } => {
            workflow.dispatch(&name)?;
            ui::display_success(&format!("Dispatched workflow {}", name));
            Ok(())
        }
    }
}

fn show_changes(workflow: &Workflow, json: bool, bump: bool) -> Result<()> {
    let details = workflow.changes(bump).context("Failed to resolve changes")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    match details {
        Some(details) => ui::display_change_details(&details),
        None => ui::display_boundary_warning(&BoundaryWarning::NoReleasableChanges),
    }
    Ok(())
}

fn release_candidate(workflow: &Workflow) -> Result<()> {
    ui::display_status("Preparing release candidate...");
    let Some(candidate) = workflow
        .release_candidate()
        .context("Failed to publish the release candidate")?
    else {
        ui::display_boundary_warning(&BoundaryWarning::NoReleasableChanges);
        return Ok(());
    };

    for warning in BoundaryWarning::skipped(&candidate.skipped) {
        ui::display_boundary_warning(&warning);
    }
    if candidate.next_version.is_none() {
        if let Some(root) = candidate.updated_projects.first() {
            ui::display_boundary_warning(&BoundaryWarning::RootVersionUnchanged {
                name: root.name.clone(),
                version: root.version.clone(),
            });
        }
    }

    ui::display_project_versions(&candidate.updated_projects);
    ui::display_success(&format!(
        "Pushed {} and {} its pull request",
        candidate.branch,
        describe(candidate.pull_request, "opened")
    ));
    if let Some(version) = &candidate.next_version {
        println!("{}", version);
    }
    Ok(())
}

fn update(workflow: &Workflow, suffix: Option<&str>, build_number: Option<&str>) -> Result<()> {
    let Some(report) = workflow
        .update(suffix, build_number)
        .context("Failed to update project versions")?
    else {
        ui::display_boundary_warning(&BoundaryWarning::NoReleasableChanges);
        return Ok(());
    };

    for warning in BoundaryWarning::skipped(&report.skipped) {
        ui::display_boundary_warning(&warning);
    }
    ui::display_project_versions(&report.versions);
    println!("\n{}", report.changelog);
    Ok(())
}

fn create_release(workflow: &Workflow, draft: bool) -> Result<()> {
    let Some(release) = workflow
        .create_release(draft)
        .context("Failed to create the release")?
    else {
        ui::display_boundary_warning(&BoundaryWarning::NoReleasableChanges);
        return Ok(());
    };

    let kind = if release.draft { "draft release" } else { "release" };
    ui::display_success(&format!(
        "Saved {} {} ({}) and pushed its tag",
        kind,
        release.tag,
        describe(release.release, "created")
    ));
    Ok(())
}

fn check_release_candidates(workflow: &Workflow) -> Result<()> {
    let blocking = workflow
        .check_release_candidates()
        .context("Failed to check release-candidate pull requests")?;

    if blocking.is_empty() {
        ui::display_success("No outdated release-candidate pull requests");
        return Ok(());
    }

    for pr in &blocking {
        ui::display_boundary_warning(&BoundaryWarning::behind(pr));
    }
    std::process::exit(1);
}

fn close_stale(workflow: &Workflow, below: Option<u64>, yes: bool) -> Result<()> {
    if !yes && !ui::confirm_action("Close release-candidate pull requests of older major versions?")? {
        ui::display_status("Nothing closed");
        return Ok(());
    }

    let report = workflow
        .close_stale(below)
        .context("Failed to close stale pull requests")?;

    for (number, reason) in report.failed {
        ui::display_boundary_warning(&BoundaryWarning::CloseFailed { number, reason });
    }
    ui::display_success(&format!(
        "Closed {} pull request(s)",
        report.closed.len()
    ));
    Ok(())
}

fn describe(upsert: Upsert, created: &'static str) -> &'static str {
    match upsert {
        Upsert::Created => created,
        Upsert::Updated => "updated",
    }
}
