//! Step sequences for the mutating git operations.
//!
//! A release candidate is published as `Checkout -> Stage -> Commit -> Push`
//! and release tags as "create every tag, then push every tag". Each step
//! yields a [StepOutcome]; the first failing step halts the sequence and is
//! reported together with the steps that already completed. Completed steps
//! are not rolled back.

use crate::error::VersioningError;
use crate::git::ReleaseWriter;
use std::fmt;

/// Steps of [PublishSequence], in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Checkout,
    Stage,
    Commit,
    Push,
}

impl PublishStep {
    fn next(self) -> Option<PublishStep> {
        match self {
            PublishStep::Checkout => Some(PublishStep::Stage),
            PublishStep::Stage => Some(PublishStep::Commit),
            PublishStep::Commit => Some(PublishStep::Push),
            PublishStep::Push => None,
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::Checkout => "checkout",
            PublishStep::Stage => "stage",
            PublishStep::Commit => "commit",
            PublishStep::Push => "push",
        };
        f.write_str(name)
    }
}

/// Result of one successfully executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    CheckedOut { branch: String },
    Staged,
    Committed { id: String },
    Pushed { remote: String, refname: String },
    TagCreated { name: String },
}

/// A step failed; `completed` lists what ran before it
#[derive(Debug, thiserror::Error)]
#[error("{step} failed after {} completed step(s): {source}", .completed.len())]
pub struct SequenceError {
    pub step: String,
    pub completed: Vec<StepOutcome>,
    #[source]
    pub source: VersioningError,
}

impl From<SequenceError> for VersioningError {
    fn from(err: SequenceError) -> Self {
        VersioningError::sequence(err.step, err.source.to_string())
    }
}

/// Publish the working tree changes as a commit on a (re)created branch
pub struct PublishSequence<'a, W: ReleaseWriter + ?Sized> {
    writer: &'a W,
    remote: String,
    branch: String,
    message: String,
    next: Option<PublishStep>,
    completed: Vec<StepOutcome>,
}

impl<'a, W: ReleaseWriter + ?Sized> PublishSequence<'a, W> {
    pub fn new(
        writer: &'a W,
        remote: impl Into<String>,
        branch: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PublishSequence {
            writer,
            remote: remote.into(),
            branch: branch.into(),
            message: message.into(),
            next: Some(PublishStep::Checkout),
            completed: Vec::new(),
        }
    }

    /// Step that `advance` will run, `None` once finished or halted
    pub fn next_step(&self) -> Option<PublishStep> {
        self.next
    }

    pub fn completed(&self) -> &[StepOutcome] {
        &self.completed
    }

    /// Run the next step.
    ///
    /// Returns `Ok(None)` when there is nothing left to run. After an error
    /// the sequence is halted.
    pub fn advance(&mut self) -> Result<Option<StepOutcome>, SequenceError> {
        let Some(step) = self.next else {
            return Ok(None);
        };

        let result = match step {
            PublishStep::Checkout => self
                .writer
                .checkout_branch(&self.branch)
                .map(|_| StepOutcome::CheckedOut {
                    branch: self.branch.clone(),
                }),
            PublishStep::Stage => self.writer.stage_all().map(|_| StepOutcome::Staged),
            PublishStep::Commit => self
                .writer
                .commit(&self.message)
                .map(|id| StepOutcome::Committed { id }),
            PublishStep::Push => self
                .writer
                .push_branch(&self.remote, &self.branch)
                .map(|_| StepOutcome::Pushed {
                    remote: self.remote.clone(),
                    refname: format!("refs/heads/{}", self.branch),
                }),
        };

        match result {
            Ok(outcome) => {
                tracing::debug!(%step, branch = %self.branch, "step completed");
                self.completed.push(outcome.clone());
                self.next = step.next();
                Ok(Some(outcome))
            }
            Err(source) => {
                self.next = None;
                Err(SequenceError {
                    step: step.to_string(),
                    completed: self.completed.clone(),
                    source,
                })
            }
        }
    }

    /// Run every remaining step
    pub fn run(mut self) -> Result<Vec<StepOutcome>, SequenceError> {
        while self.advance()?.is_some() {}
        Ok(self.completed)
    }
}

/// Create every tag at HEAD, then push every tag.
///
/// Nothing is pushed unless all tags were created.
pub struct TagSequence<'a, W: ReleaseWriter + ?Sized> {
    writer: &'a W,
    remote: String,
    tags: Vec<String>,
}

impl<'a, W: ReleaseWriter + ?Sized> TagSequence<'a, W> {
    pub fn new(writer: &'a W, remote: impl Into<String>, tags: Vec<String>) -> Self {
        TagSequence {
            writer,
            remote: remote.into(),
            tags,
        }
    }

    pub fn run(self) -> Result<Vec<StepOutcome>, SequenceError> {
        let mut completed = Vec::with_capacity(self.tags.len() * 2);

        for name in &self.tags {
            if let Err(source) = self.writer.create_tag(name) {
                return Err(SequenceError {
                    step: format!("create tag {}", name),
                    completed,
                    source,
                });
            }
            completed.push(StepOutcome::TagCreated { name: name.clone() });
        }

        for name in &self.tags {
            if let Err(source) = self.writer.push_tag(&self.remote, name) {
                return Err(SequenceError {
                    step: format!("push tag {}", name),
                    completed,
                    source,
                });
            }
            completed.push(StepOutcome::Pushed {
                remote: self.remote.clone(),
                refname: format!("refs/tags/{}", name),
            });
        }

        Ok(completed)
    }
}
