//! Check Synchronisation
//!
//! Runs the pipeline end to end:
//! - Fetches all workflow files from a [`WorkflowSource`]
//! - Parses them and expands job names into check names
//! - Compares the result with the branch's current required checks
//! - Publishes the full list once through a [`ProtectionSink`]
//!
//! Any failure aborts the run before anything is published.

use log::{info, warn};

use crate::error::Result;
use crate::github::{ProtectionSink, WorkflowSource};
use crate::workflow::{expand_documents, parse_workflow, WorkflowDocument};

/// Difference between the required checks on a branch and the expanded names.
///
/// Lists are compared as sets and keep first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChecksDiff {
    /// Expanded names not yet required
    pub added: Vec<String>,
    /// Required names no workflow produces anymore
    pub removed: Vec<String>,
    /// Names both required and produced
    pub unchanged: Vec<String>,
}

impl ChecksDiff {
    /// Computes the change from `current` to `desired`.
    pub fn between(current: &[String], desired: &[String]) -> Self {
        let mut diff = Self::default();

        for name in unique(desired) {
            if current.contains(name) {
                diff.unchanged.push(name.clone());
            } else {
                diff.added.push(name.clone());
            }
        }

        for name in unique(current) {
            if !desired.contains(name) {
                diff.removed.push(name.clone());
            }
        }

        diff
    }

    /// Checks if publishing would leave the required set unchanged.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// First occurrence of each name, in order.
fn unique(names: &[String]) -> impl Iterator<Item = &String> {
    names
        .iter()
        .enumerate()
        .filter(move |&(i, name)| !names[..i].contains(name))
        .map(|(_, name)| name)
}

/// Outcome of a synchronisation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub branch: String,
    /// Expanded check names, in workflow/job/value order
    pub checks: Vec<String>,
    pub diff: ChecksDiff,
    /// Whether the sink was updated (false for dry runs)
    pub published: bool,
}

/// Fetches, parses and expands every workflow of a source.
pub async fn collect_check_names(source: &dyn WorkflowSource) -> Result<Vec<String>> {
    let raw = source.fetch_workflows().await?;

    let documents = raw
        .iter()
        .map(|workflow| parse_workflow(&workflow.name, &workflow.contents))
        .collect::<Result<Vec<WorkflowDocument>>>()?;

    Ok(expand_documents(&documents)?)
}

/// Keeps one branch's required status checks equal to the jobs its
/// workflows run.
///
/// # Example
///
/// ```rust,no_run
/// use grc::config::Repository;
/// use grc::github::GitHubClient;
/// use grc::sync::Synchroniser;
///
/// # async fn run() -> grc::Result<()> {
/// let repo: Repository = "simonrw/rynamodb".parse()?;
/// let client = GitHubClient::new("ghp_token", "https://api.github.com", &repo)?;
///
/// let mut synchroniser = Synchroniser::new(&client, &client);
/// synchroniser.set_dry_run(true);
///
/// let report = synchroniser.run("main").await?;
/// println!("{} checks, {} new", report.checks.len(), report.diff.added.len());
/// # Ok(())
/// # }
/// ```
pub struct Synchroniser<'a> {
    source: &'a dyn WorkflowSource,
    sink: &'a dyn ProtectionSink,
    dry_run: bool,
    strict: bool,
}

impl<'a> Synchroniser<'a> {
    pub fn new(source: &'a dyn WorkflowSource, sink: &'a dyn ProtectionSink) -> Self {
        Self {
            source,
            sink,
            dry_run: false,
            strict: false,
        }
    }

    /// Enables or disables dry run mode (compute and diff, never publish).
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Requires branches to be up to date before merging.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Synchronises the required checks of `branch`.
    pub async fn run(&self, branch: &str) -> Result<SyncReport> {
        info!("Synchronising required checks on '{}'", branch);

        let checks = collect_check_names(self.source).await?;
        let current = self.sink.current_checks(branch).await?;
        let diff = ChecksDiff::between(&current, &checks);

        info!(
            "{} checks: {} added, {} removed, {} unchanged",
            checks.len(),
            diff.added.len(),
            diff.removed.len(),
            diff.unchanged.len()
        );

        if self.dry_run {
            if !diff.removed.is_empty() {
                warn!(
                    "Dry run: would stop requiring {} checks: {:?}",
                    diff.removed.len(),
                    diff.removed
                );
            }
            info!("Dry run: leaving '{}' unchanged", branch);
            return Ok(SyncReport {
                branch: branch.to_string(),
                checks,
                diff,
                published: false,
            });
        }

        self.sink.replace_checks(branch, &checks, self.strict).await?;

        Ok(SyncReport {
            branch: branch.to_string(),
            checks,
            diff,
            published: true,
        })
    }
}
